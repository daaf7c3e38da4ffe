use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    #[error("Invalid value for {env_var}: {reason}")]
    InvalidValue { env_var: String, reason: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Environment variable that sets a dotted settings key
pub fn to_env_var(field: &str) -> String {
    format!("TICKERTALK_{}", field.to_uppercase().replace('.', "__"))
}

/// Errors surfaced to HTTP clients. The body never contains upstream detail.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("completion service unavailable")]
    Upstream(#[source] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(
            to_env_var("completion.api_key"),
            "TICKERTALK_COMPLETION__API_KEY"
        );
        assert_eq!(to_env_var("tools"), "TICKERTALK_TOOLS");
    }

    #[test]
    fn test_upstream_error_hides_cause() {
        let err = ApiError::Upstream(anyhow::anyhow!("secret token rejected by 10.0.0.7"));
        assert_eq!(err.to_string(), "completion service unavailable");
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
