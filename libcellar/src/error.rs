//! Error types for Cellar

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CellarError>;

#[derive(Error, Debug)]
pub enum CellarError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Prompt or stdin failure in a front end
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to format output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CellarError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CellarError::InvalidInput(_) => 3,
            CellarError::Api(ApiError::Authentication(_)) => 2,
            CellarError::Api(_) => 1,
            CellarError::Config(_) => 1,
            CellarError::Session(_) => 1,
            CellarError::Io(_) | CellarError::Output(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to access session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Request rejected: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed with status {status}: {message}")]
    Request { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success HTTP status into an error variant
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ApiError::Authentication(message),
            400 | 422 => ApiError::Validation(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::Request { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = CellarError::InvalidInput("Rating is required".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_authentication_error() {
        let error = CellarError::Api(ApiError::Authentication("Not logged in".to_string()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_other_errors() {
        let network = CellarError::Api(ApiError::Network("Connection refused".to_string()));
        assert_eq!(network.exit_code(), 1);

        let request = CellarError::Api(ApiError::Request {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(request.exit_code(), 1);

        let config = CellarError::Config(ConfigError::MissingField("api.base_url".to_string()));
        assert_eq!(config.exit_code(), 1);

        let session = CellarError::Session(SessionError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        )));
        assert_eq!(session.exit_code(), 1);
    }

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            ApiError::from_status(401, "x".to_string()),
            ApiError::Authentication(_)
        ));
        assert!(matches!(
            ApiError::from_status(403, "x".to_string()),
            ApiError::Authentication(_)
        ));
        assert!(matches!(
            ApiError::from_status(400, "x".to_string()),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from_status(404, "x".to_string()),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(503, "x".to_string()),
            ApiError::Request { status: 503, .. }
        ));
    }

    #[test]
    fn test_error_message_formatting() {
        let error = CellarError::Api(ApiError::Request {
            status: 500,
            message: "Internal Server Error".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "API error: Request failed with status 500: Internal Server Error"
        );

        let error = CellarError::Config(ConfigError::InvalidValue {
            field: "api.base_url".to_string(),
            reason: "relative URL without a base".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid value for api.base_url: relative URL without a base"
        );
    }

    #[test]
    fn test_error_conversion_from_api_error() {
        let error: CellarError = ApiError::NotFound("wine 7".to_string()).into();
        match error {
            CellarError::Api(ApiError::NotFound(msg)) => assert_eq!(msg, "wine 7"),
            _ => panic!("Expected CellarError::Api"),
        }
    }
}
