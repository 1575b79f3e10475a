use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::assets::assets_errors::AssetError;
use crate::errors::DatabaseError;

/// Result type for price operations
pub type Result<T> = std::result::Result<T, PriceError>;

/// Errors that can occur during price store operations
#[derive(Error, Debug)]
pub enum PriceError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Price record not found: {0}")]
    NotFound(String),

    #[error("Duplicate price record: {0}")]
    Duplicate(String),

    #[error("Invalid price data: {0}")]
    InvalidData(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<DieselError> for PriceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => PriceError::NotFound("Record not found".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                PriceError::Duplicate(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                PriceError::ConstraintViolation(info.message().to_string())
            }
            _ => PriceError::DatabaseError(err.to_string()),
        }
    }
}

impl From<DatabaseError> for PriceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::QueryFailed(e) => PriceError::from(e),
            _ => PriceError::DatabaseError(err.to_string()),
        }
    }
}

impl From<AssetError> for PriceError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::NotFound(msg) => PriceError::NotFound(msg),
            AssetError::InvalidData(msg) => PriceError::InvalidData(msg),
            _ => PriceError::DatabaseError(err.to_string()),
        }
    }
}

impl From<rust_decimal::Error> for PriceError {
    fn from(err: rust_decimal::Error) -> Self {
        PriceError::InvalidData(err.to_string())
    }
}
