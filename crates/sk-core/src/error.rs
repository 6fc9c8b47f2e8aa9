use crate::region::WorldId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building or validating core configuration.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The two corners of a region lie in different worlds.
    #[error("invalid region: corners are in different worlds ({first} and {second})")]
    InvalidRegion {
        /// World of the first corner.
        first: WorldId,
        /// World of the second corner.
        second: WorldId,
    },

    /// An area definition failed validation.
    #[error("invalid area: {0}")]
    InvalidArea(String),

    /// A mob type definition failed validation.
    #[error("invalid mob type: {0}")]
    InvalidType(String),

    /// A spawn type id resolves neither to a registered mob type nor to a built-in kind.
    #[error("unknown spawn type: \"{0}\"")]
    UnknownType(String),

    /// A loot entry or table failed validation.
    #[error("invalid loot: {0}")]
    InvalidLoot(String),
}
