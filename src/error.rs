//! Structured error types for registry operations.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Lookup errors
    ConfigNotFound,
    CategoryNotFound,
    PathNotFound,

    // Value errors
    TypeConversionFailure,

    // Store errors
    StoreUnavailable,
    StoreWriteFailure,

    // Startup errors
    DiscoveryFailure,
    InitializationFailure,

    InternalError,
}

/// How a boundary caller (an HTTP layer, a CLI) should present an error.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseClass {
    MissingConfiguration,
    BadValue,
    Internal,
}

impl ErrorCode {
    pub fn response_class(&self) -> ResponseClass {
        match self {
            ErrorCode::ConfigNotFound | ErrorCode::CategoryNotFound | ErrorCode::PathNotFound => {
                ResponseClass::MissingConfiguration
            }
            ErrorCode::TypeConversionFailure | ErrorCode::StoreWriteFailure => {
                ResponseClass::BadValue
            }
            ErrorCode::StoreUnavailable
            | ErrorCode::DiscoveryFailure
            | ErrorCode::InitializationFailure
            | ErrorCode::InternalError => ResponseClass::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.response_class() == ResponseClass::MissingConfiguration
    }
}

/// Structured error returned by entries, modules, and the registry.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ConfigError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn not_found(name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration '{}' not found", name),
        )
        .with_field(name)
    }

    pub fn category_not_found(category: &str) -> Self {
        Self::new(
            ErrorCode::CategoryNotFound,
            format!("Category '{}' not found", category),
        )
        .with_field(category)
    }

    pub fn path_not_found(path: &str) -> Self {
        Self::new(
            ErrorCode::PathNotFound,
            format!("No record stored at '{}'", path),
        )
        .with_field(path)
    }

    pub fn conversion(converter: &str, raw: impl fmt::Display, reason: &str) -> Self {
        Self::new(
            ErrorCode::TypeConversionFailure,
            format!("Cannot convert '{}' with {} converter", raw, converter),
        )
        .with_details(reason)
    }

    pub fn store_unavailable(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::StoreUnavailable, err.to_string())
    }

    pub fn store_write(path: &str) -> Self {
        Self::new(
            ErrorCode::StoreWriteFailure,
            format!("Failed to persist configuration at '{}'", path),
        )
        .with_field(path)
    }

    pub fn initialization(category: &str, cause: &ConfigError) -> Self {
        Self::new(
            ErrorCode::InitializationFailure,
            format!("Category '{}' failed to initialize: {}", category, cause),
        )
        .with_field(category)
        .with_details(format!("{:?}", cause.code))
    }

    pub fn discovery(unit: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::DiscoveryFailure, reason).with_field(unit)
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    pub fn response_class(&self) -> ResponseClass {
        self.code.response_class()
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConfigError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ConfigError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ConfigError>() {
            Ok(config_err) => config_err,
            Err(err) => ConfigError::internal(err),
        }
    }
}

/// Result type for registry operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
