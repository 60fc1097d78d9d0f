use serde::Deserialize;
use thiserror::Error;

/// Error body the backend returns on non-2xx responses. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorBody {
    /// Parse leniently: anything that is not a JSON object with a string
    /// `detail` yields an empty body.
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }
}

/// Failure of a single backend request. `Display` is the text shown to the user.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request never produced a response.
    #[error("{0}")]
    Transport(String),
    /// Non-2xx response. `message` is the backend's `detail`, or `HTTP <status>`.
    #[error("{message}")]
    Http { status: u16, message: String },
    /// 2xx response whose body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl RequestError {
    pub fn from_status(status: u16, raw_body: &str) -> Self {
        let message = ErrorBody::parse(raw_body)
            .detail
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("HTTP {status}"));
        RequestError::Http { status, message }
    }

    /// Exit code convention for one-shot commands:
    /// 1=client error (4xx), 2=server error (5xx), 3=connection/decoding error.
    pub fn exit_code(&self) -> i32 {
        match self {
            RequestError::Http { status, .. } if (400..500).contains(status) => 1,
            RequestError::Http { .. } => 2,
            RequestError::Transport(_) | RequestError::Decode(_) => 3,
        }
    }

    /// Machine-readable kind, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            RequestError::Transport(_) => "connection_error",
            RequestError::Http { .. } => "http_error",
            RequestError::Decode(_) => "decode_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_wins_over_status() {
        let err = RequestError::from_status(500, r#"{"detail":"boom"}"#);
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_detail_falls_back_to_status() {
        assert_eq!(RequestError::from_status(404, "{}").to_string(), "HTTP 404");
        assert_eq!(
            RequestError::from_status(502, "<html>bad gateway</html>").to_string(),
            "HTTP 502"
        );
        assert_eq!(RequestError::from_status(401, r#"{"detail":""}"#).to_string(), "HTTP 401");
    }

    #[test]
    fn non_string_detail_is_ignored() {
        let err = RequestError::from_status(422, r#"{"detail":[{"loc":["body","to"]}]}"#);
        assert_eq!(err.to_string(), "HTTP 422");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn transport_errors_show_their_message() {
        let err = RequestError::Transport("connection refused".into());
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.kind(), "connection_error");
    }
}
