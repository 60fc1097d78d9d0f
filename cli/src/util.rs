use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::json;

use asistente_core::error::RequestError;

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    print_error("cli_error", message, docs_hint);
    std::process::exit(4);
}

/// Structured error on stderr, same shape for every command.
pub fn print_error(kind: &str, message: &str, docs_hint: Option<&str>) {
    let mut err = json!({
        "error": kind,
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!(
        "{}",
        serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string())
    );
}

/// Print a request failure and return its exit code.
pub fn report_request_error(err: &RequestError) -> i32 {
    let hint = match err {
        RequestError::Transport(_) => Some("Is the backend reachable? Check ASISTENTE_API_URL."),
        RequestError::Http { status: 401 | 403, .. } => {
            Some("Run `asistente login` and store the session cookie with --cookie.")
        }
        _ => None,
    };
    print_error(err.kind(), &err.to_string(), hint);
    err.exit_code()
}

pub fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

pub fn default_state_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("asistente");
    config_dir.join("state.json")
}

/// Write `data` to `path`, creating parent directories, readable by the owner only.
pub fn write_private(path: &Path, data: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(data.as_bytes())?;

    Ok(())
}

// Unix-specific imports for file permissions
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

// No-op on non-unix (won't compile for Windows without this)
#[cfg(not(unix))]
trait OpenOptionsExt {
    fn mode(&mut self, _mode: u32) -> &mut Self;
}

#[cfg(not(unix))]
impl OpenOptionsExt for std::fs::OpenOptions {
    fn mode(&mut self, _mode: u32) -> &mut Self {
        self
    }
}
