// ⚠️ Error taxonomy
// Everything except a broken data directory at startup is recoverable.

use std::path::PathBuf;

use crate::seeder::SeedError;

/// Rejected user input. The operation is refused and state stays unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("No meal name provided")]
    EmptyMealName,

    #[error("Invalid quantity {0}: must be greater than 0")]
    NonPositiveQuantity(f64),

    #[error("Meal '{0}' already exists in database")]
    DuplicateMeal(String),

    #[error("Meal '{0}' not found in database")]
    MealNotFound(String),

    #[error("Unknown category '{0}'. Valid categories: Breakfast, Lunch, Dinner, Snack1, Snack2")]
    UnknownCategory(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MealError {
    /// Network failure while talking to the food search API
    #[error("Transport error: {0}")]
    Transport(String),

    /// API key rejected
    #[error("API authentication failed (HTTP {status})")]
    Auth { status: u16 },

    /// Any other unusable API answer
    #[error("Food search API error: {0}")]
    Api(String),

    /// Missing or corrupt table file
    #[error("Failed to read {}: {reason}", path.display())]
    StorageRead { path: PathBuf, reason: String },

    #[error("Failed to write {}: {reason}", path.display())]
    StorageWrite { path: PathBuf, reason: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<SeedError> for MealError {
    fn from(err: SeedError) -> Self {
        match err {
            SeedError::Transport(msg) => MealError::Transport(msg),
            SeedError::Auth { status } => MealError::Auth { status },
            other => MealError::Api(other.to_string()),
        }
    }
}

pub type Result<T, E = MealError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_errors_map_onto_taxonomy() {
        let err: MealError = SeedError::Auth { status: 403 }.into();
        assert!(matches!(err, MealError::Auth { status: 403 }));

        let err: MealError = SeedError::Transport("connection reset".to_string()).into();
        assert!(matches!(err, MealError::Transport(_)));

        let err: MealError = SeedError::HttpStatus(500).into();
        assert!(matches!(err, MealError::Api(_)));
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::DuplicateMeal("Apple".to_string()).to_string(),
            "Meal 'Apple' already exists in database"
        );
        assert_eq!(ValidationError::EmptyMealName.to_string(), "No meal name provided");
    }
}
