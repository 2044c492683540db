use crate::entity::Entity;

/// Errors raised by the ECS.
///
/// Registration errors (`AlreadyRegistered`, `NotRegistered`, `ConflictingAccess`)
/// surface while a world is being assembled and are meant to abort start-up.
/// `MissingComponent` and `StaleEntity` come from direct lookups during a frame;
/// callers skip the operation for that tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    #[error("component `{0}` is already registered")]
    AlreadyRegistered(&'static str),

    #[error("component `{0}` is not registered")]
    NotRegistered(&'static str),

    #[error("query requests conflicting access to `{0}`")]
    ConflictingAccess(&'static str),

    #[error("entity {entity} has no `{component}` component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },

    #[error("entity {0} is not alive")]
    StaleEntity(Entity),

    #[error("resource `{0}` is not present")]
    MissingResource(&'static str),
}
