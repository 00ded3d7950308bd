use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// `(provider, external_id)` is already taken by another artist row
    #[error("Duplicate artist: {provider}/{external_id}")]
    Duplicate {
        provider: String,
        external_id: String,
    },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl LibraryError {
    /// True when a write lost a race on the `(provider, external_id)` key
    pub fn is_unique_violation(&self) -> bool {
        match self {
            LibraryError::Duplicate { .. } => true,
            LibraryError::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LibraryError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_is_unique_violation() {
        let err = LibraryError::Duplicate {
            provider: "spotify".to_string(),
            external_id: "x".to_string(),
        };
        assert!(err.is_unique_violation());
        assert_eq!(err.to_string(), "Duplicate artist: spotify/x");
    }

    #[test]
    fn test_other_errors_are_not_unique_violations() {
        let err = LibraryError::Migration("boom".to_string());
        assert!(!err.is_unique_violation());
        assert!(!err.is_not_found());
    }
}
