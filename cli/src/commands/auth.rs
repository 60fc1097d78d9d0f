use serde_json::json;

use crate::config::Config;
use crate::store::{AUTH_COOKIE_KEY, FileStore, KeyValueStore};
use crate::util::{print_error, print_json};

/// Open the backend's Google sign-in page in the system browser.
pub fn open_auth_page(config: &Config) -> String {
    let url = config.auth_google_url();
    eprintln!("Opening browser for Google sign-in...");
    eprintln!("If the browser doesn't open, visit: {url}");
    if let Err(e) = open::that(&url) {
        tracing::warn!(error = %e, "could not launch a browser");
    }
    url
}

/// Accept `name=value` or a pasted `Cookie: name=value` header line.
pub fn normalize_cookie(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix("Cookie:")
        .or_else(|| raw.strip_prefix("cookie:"))
        .unwrap_or(raw)
        .trim();
    let (name, _value) = raw.split_once('=')?;
    if name.trim().is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some(raw.to_string())
}

pub fn login(config: &Config, cookie: Option<&str>) -> i32 {
    let Some(raw) = cookie else {
        let url = open_auth_page(config);
        print_json(&json!({
            "status": "browser_opened",
            "auth_url": url,
            "next_step": "After signing in, run `asistente login --cookie '<name>=<value>'` with the backend's session cookie."
        }));
        return 0;
    };

    let Some(cookie) = normalize_cookie(raw) else {
        print_error(
            "validation_failed",
            "cookie must look like name=value",
            Some("Copy the session cookie set by the backend after Google sign-in."),
        );
        return 4;
    };

    let mut store = FileStore::open(&config.state_file);
    match store.set(AUTH_COOKIE_KEY, &cookie) {
        Ok(()) => {
            print_json(&json!({
                "status": "cookie_stored",
                "state_file": store.path().to_string_lossy()
            }));
            0
        }
        Err(e) => {
            print_error("state_error", &e.to_string(), None);
            4
        }
    }
}

pub fn logout(config: &Config) -> i32 {
    let mut store = FileStore::open(&config.state_file);
    match store.remove(AUTH_COOKIE_KEY) {
        Ok(()) => {
            print_json(&json!({
                "status": "logged_out",
                "state_file": store.path().to_string_lossy()
            }));
            0
        }
        Err(e) => {
            print_error("state_error", &e.to_string(), None);
            4
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_header_forms() {
        assert_eq!(normalize_cookie(" session=abc ").as_deref(), Some("session=abc"));
        assert_eq!(
            normalize_cookie("Cookie: session=abc; theme=dark").as_deref(),
            Some("session=abc; theme=dark")
        );
    }

    #[test]
    fn rejects_values_without_a_name() {
        assert_eq!(normalize_cookie("abc"), None);
        assert_eq!(normalize_cookie("=abc"), None);
        assert_eq!(normalize_cookie("my session=abc"), None);
    }

    fn config_with_state(name: &str) -> Config {
        let path = std::env::temp_dir()
            .join(format!("asistente-auth-{}-{name}", std::process::id()))
            .join("state.json");
        let _ = std::fs::remove_file(&path);
        Config::new("http://127.0.0.1:9", "America/Mazatlan", "angel", Some(path)).unwrap()
    }

    #[test]
    fn login_stores_cookie_and_logout_removes_it() {
        let config = config_with_state("roundtrip");
        {
            let mut store = FileStore::open(&config.state_file);
            store.set("agent_session_id", "angel|abcd1234").unwrap();
        }

        assert_eq!(login(&config, Some("Cookie: s=1")), 0);
        let store = FileStore::open(&config.state_file);
        assert_eq!(store.get(AUTH_COOKIE_KEY).as_deref(), Some("s=1"));

        assert_eq!(logout(&config), 0);
        let store = FileStore::open(&config.state_file);
        assert_eq!(store.get(AUTH_COOKIE_KEY), None);
        assert_eq!(store.get("agent_session_id").as_deref(), Some("angel|abcd1234"));

        let _ = std::fs::remove_dir_all(config.state_file.parent().unwrap());
    }

    #[test]
    fn malformed_cookie_is_not_stored() {
        let config = config_with_state("malformed");
        assert_eq!(login(&config, Some("not a cookie")), 4);
        assert_eq!(FileStore::open(&config.state_file).get(AUTH_COOKIE_KEY), None);
    }
}
