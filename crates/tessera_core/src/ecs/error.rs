use crate::ecs::{ComponentId, Entity};
use thiserror::Error;

/// Errors raised while writing or reading a registry archive.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("archive i/o failed")]
    Io(#[from] std::io::Error),

    #[error("archive contains component id {component_id}, which is not registered in the target registry")]
    UnknownComponent { component_id: ComponentId },

    #[error(
        "component {name} (id {component_id}) has stride {expected} bytes but the archive stores {actual} bytes"
    )]
    StrideMismatch {
        component_id: ComponentId,
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("entity {entity} appears more than once in {section}")]
    DuplicateEntity {
        entity: Entity,
        section: &'static str,
    },

    #[error("archive is inconsistent: {reason}")]
    Corrupt { reason: String },
}
