//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! when crossing a port boundary.

/// Top-level error returned across port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// An integration (adapter) failed; the source carries the typed cause.
    #[error("integration error")]
    Integration(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("integration must not be empty")]
    EmptyIntegration,

    #[error("entity id must not be empty")]
    EmptyEntityId,

    /// Entity ids follow the `<domain>.<object_id>` convention.
    #[error("invalid entity id {0:?}, expected <domain>.<object_id>")]
    InvalidEntityId(String),

    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error("unknown service {0:?}")]
    UnknownService(String),
}

/// A lookup did not match anything.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
