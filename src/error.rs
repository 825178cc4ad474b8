use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis connection timed out after {0}ms")]
    ConnectTimeout(u64),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No download available for {version} build {build}")]
    NoDownloadAvailable { version: String, build: u32 },
}

#[derive(Debug, Error)]
pub enum JavaConfigError {
    #[error("Failed to read Java rule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse Java rule file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors returned by the aggregation service.
///
/// Variants are stable so an HTTP layer can map them to status codes
/// without inspecting messages.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(ProviderError),

    #[error("No download available for {version} build {build}")]
    NoDownloadAvailable { version: String, build: u32 },

    #[error("Invalid value for {field}: {value}")]
    Validation { field: String, value: String },
}

impl ServiceError {
    pub fn validation(field: &str, value: &str) -> Self {
        ServiceError::Validation {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// HTTP status code an API layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) | ServiceError::NoDownloadAvailable { .. } => 404,
            ServiceError::Upstream(_) => 502,
            ServiceError::Validation { .. } => 400,
        }
    }
}

impl From<ProviderError> for ServiceError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(what) => ServiceError::NotFound(what),
            ProviderError::NoDownloadAvailable { version, build } => {
                ServiceError::NoDownloadAvailable { version, build }
            }
            other => ServiceError::Upstream(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ProviderError::NotFound("paper 9.9".to_string()), 404)]
    #[case(ProviderError::InvalidResponse("bad json".to_string()), 502)]
    #[case(
        ProviderError::NoDownloadAvailable { version: "1.8".to_string(), build: 1 },
        404
    )]
    fn provider_errors_map_to_status_codes(#[case] err: ProviderError, #[case] expected: u16) {
        assert_eq!(ServiceError::from(err).status_code(), expected);
    }

    #[test]
    fn validation_error_maps_to_bad_request() {
        let err = ServiceError::validation("build", "abc");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Invalid value for build: abc");
    }
}
