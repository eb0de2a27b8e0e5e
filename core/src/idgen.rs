//! Identifier generation.

use crate::error::IdGenerationError;
use uuid::Uuid;

/// Produces identifiers unique across the lifetime of the process.
pub trait IdGenerator: Send + Sync {
    /// Generate a new identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdGenerationError`] if no identifier can be produced.
    fn generate(&self) -> Result<String, IdGenerationError>;
}

/// Random (v4) UUID identifiers in hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Result<String, IdGenerationError> {
        Ok(Uuid::new_v4().to_string())
    }
}
