use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::errors::DatabaseError;

/// Custom error type for asset-related operations
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Market data error: {0}")]
    MarketDataError(String),
}

impl From<DieselError> for AssetError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => AssetError::NotFound("Record not found".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                AssetError::AlreadyExists(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                AssetError::ConstraintViolation(info.message().to_string())
            }
            _ => AssetError::DatabaseError(err.to_string()),
        }
    }
}

impl From<DatabaseError> for AssetError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionFailed(e) => {
                AssetError::DatabaseError(format!("Connection failed: {}", e))
            }
            DatabaseError::PoolCreationFailed(e) => {
                AssetError::DatabaseError(format!("Pool creation failed: {}", e))
            }
            DatabaseError::QueryFailed(e) => AssetError::from(e),
            DatabaseError::MigrationFailed(e) => {
                AssetError::DatabaseError(format!("Migration failed: {}", e))
            }
        }
    }
}

/// Result type for asset operations
pub type Result<T> = std::result::Result<T, AssetError>;
