//! Sushi error types

use rusqlite::ErrorCode;
use serde::Serialize;
use thiserror::Error;

/// Application error
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying store failure (SQL, migration, lock poisoning)
    #[error("database error: {0}")]
    Database(rusqlite::Error),

    /// Missing row or file
    #[error("not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("conflict: {0}")]
    Conflict(String),

    /// Filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Path is not usable for the requested operation
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Rejected input
    #[error("validation error: {0}")]
    Validation(String),

    /// Settings could not be read or written
    #[error("config error: {0}")]
    Config(String),

    /// File server failed to bind or run
    #[error("server error: {0}")]
    Server(String),

    #[error("{0}")]
    General(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ffi_err, message) = &err {
            if ffi_err.code == ErrorCode::ConstraintViolation {
                let detail = message.clone().unwrap_or_else(|| ffi_err.to_string());
                match ffi_err.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        return AppError::Conflict(detail);
                    }
                    rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                        return AppError::NotFound(format!("referenced row missing ({})", detail));
                    }
                    _ => {}
                }
            }
        }
        AppError::Database(err)
    }
}

/// Error shape returned across the process API
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct CommandError {
    pub code: String,
    pub message: String,
}

impl AppError {
    /// Stable `E_*` code reported to callers
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "E_DB_ERROR",
            AppError::NotFound(_) => "E_NOT_FOUND",
            AppError::Conflict(_) => "E_CONFLICT",
            AppError::Io(_) => "E_IO_ERROR",
            AppError::InvalidPath(_) => "E_PATH_INVALID",
            AppError::Validation(_) => "E_VALIDATION",
            AppError::Config(_) => "E_CONFIG",
            AppError::Server(_) => "E_SERVER",
            AppError::General(_) => "E_GENERAL",
        }
    }
}

impl From<AppError> for CommandError {
    fn from(err: AppError) -> Self {
        CommandError {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        CommandError {
            code: self.code().to_string(),
            message: self.to_string(),
        }
        .serialize(serializer)
    }
}

pub type AppResult<T> = Result<T, AppError>;
