use std::path::PathBuf;

use thiserror::Error;

use crate::util::default_state_path;

pub const DEFAULT_API_URL: &str = "https://asistente.ponganos10.online";

pub const INVOKE_PATH: &str = "/agent/invoke";
pub const GMAIL_PATH: &str = "/gmail/send";
pub const CALENDAR_PATH: &str = "/calendar/event";
pub const AUTH_GOOGLE_PATH: &str = "/auth/google";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },
    #[error("unknown timezone '{0}' (expected an IANA name such as America/Mazatlan)")]
    UnknownTimezone(String),
    #[error("session prefix must be non-empty and must not contain '|'")]
    InvalidSessionPrefix,
}

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    api_base: url::Url,
    /// Label sent with calendar events. Independent of the offset in the timestamps.
    pub timezone: String,
    pub session_prefix: String,
    pub state_file: PathBuf,
}

impl Config {
    pub fn new(
        api_url: &str,
        timezone: &str,
        session_prefix: &str,
        state_file: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let api_base = url::Url::parse(api_url).map_err(|e| ConfigError::InvalidApiUrl {
            url: api_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(api_base.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApiUrl {
                url: api_url.to_string(),
                reason: format!("unsupported scheme '{}'", api_base.scheme()),
            });
        }

        if timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ConfigError::UnknownTimezone(timezone.to_string()));
        }

        if session_prefix.is_empty() || session_prefix.contains('|') {
            return Err(ConfigError::InvalidSessionPrefix);
        }

        Ok(Self {
            api_base,
            timezone: timezone.to_string(),
            session_prefix: session_prefix.to_string(),
            state_file: state_file.unwrap_or_else(default_state_path),
        })
    }

    pub fn api_base(&self) -> &url::Url {
        &self.api_base
    }

    /// Absolute URL for a backend path. Paths are appended to the base, so a
    /// base with a path prefix keeps it.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_base.as_str().trim_end_matches('/'))
    }

    pub fn invoke_url(&self) -> String {
        self.endpoint(INVOKE_PATH)
    }

    pub fn gmail_url(&self) -> String {
        self.endpoint(GMAIL_PATH)
    }

    pub fn calendar_url(&self) -> String {
        self.endpoint(CALENDAR_PATH)
    }

    pub fn auth_google_url(&self) -> String {
        self.endpoint(AUTH_GOOGLE_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_url: &str) -> Result<Config, ConfigError> {
        Config::new(
            api_url,
            "America/Mazatlan",
            "angel",
            Some(PathBuf::from("/tmp/state.json")),
        )
    }

    #[test]
    fn endpoints_are_appended_to_base() {
        let cfg = config("https://asistente.ponganos10.online").unwrap();
        assert_eq!(
            cfg.invoke_url(),
            "https://asistente.ponganos10.online/agent/invoke"
        );
        assert_eq!(cfg.gmail_url(), "https://asistente.ponganos10.online/gmail/send");
        assert_eq!(
            cfg.calendar_url(),
            "https://asistente.ponganos10.online/calendar/event"
        );
        assert_eq!(
            cfg.auth_google_url(),
            "https://asistente.ponganos10.online/auth/google"
        );
    }

    #[test]
    fn base_path_prefix_and_trailing_slash_are_handled() {
        let cfg = config("http://localhost:8000/api/").unwrap();
        assert_eq!(cfg.invoke_url(), "http://localhost:8000/api/agent/invoke");
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(matches!(
            config("not a url"),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
        assert!(matches!(
            config("ftp://example.com"),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
    }

    #[test]
    fn rejects_unknown_timezone_and_bad_prefix() {
        assert_eq!(
            Config::new("http://x", "Mars/Olympus", "angel", None).unwrap_err(),
            ConfigError::UnknownTimezone("Mars/Olympus".into())
        );
        assert_eq!(
            Config::new("http://x", "UTC", "a|b", None).unwrap_err(),
            ConfigError::InvalidSessionPrefix
        );
        assert_eq!(
            Config::new("http://x", "UTC", "", None).unwrap_err(),
            ConfigError::InvalidSessionPrefix
        );
    }
}
