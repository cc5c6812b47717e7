//! Error types for the snapshot pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Config store API error: {0}")]
    ApiError(String),

    #[error("MySQL error: {0}")]
    MySqlError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("No chatbots returned by the config store")]
    EmptyDirectory,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<mysql_async::Error> for Error {
    fn from(err: mysql_async::Error) -> Self {
        Error::MySqlError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = Error::ConfigError("missing api key".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("missing api key"));
    }

    #[test]
    fn test_error_display_api() {
        let err = Error::ApiError("HTTP 500".to_string());
        assert!(err.to_string().contains("Config store API error"));
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[test]
    fn test_error_display_empty_directory() {
        let err = Error::EmptyDirectory;
        assert!(err.to_string().contains("No chatbots"));
    }

    #[test]
    fn test_error_display_mysql() {
        let err = Error::MySqlError("connection refused".to_string());
        let msg = err.to_string();
        assert!(msg.contains("MySQL error"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::IoError(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::SerializationError(_)));
        assert!(err.to_string().contains("Serialization error"));
    }

    #[test]
    fn test_error_debug_impl() {
        let err = Error::EmptyDirectory;
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("EmptyDirectory"));
    }

    #[test]
    fn test_result_type_err() {
        let result: Result<i32> = Err(Error::InvalidArgument("bad".to_string()));
        assert!(result.is_err());
    }
}
