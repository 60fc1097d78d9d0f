use clap::Subcommand;
use serde_json::json;

use crate::config::Config;
use crate::session::SessionManager;
use crate::store::FileStore;
use crate::util::{print_error, print_json};

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Show the active session id (creates one if none is stored)
    Show,
    /// Forget the active session id and create a new one
    Reset,
}

pub fn run(config: &Config, command: SessionCommands) -> i32 {
    let store = FileStore::open(&config.state_file);
    let mut sessions = SessionManager::new(Box::new(store), config.session_prefix.clone());

    let (status, result) = match command {
        SessionCommands::Show => ("active", sessions.get_or_create()),
        SessionCommands::Reset => ("reset", sessions.reset()),
    };

    match result {
        Ok(session_id) => {
            print_json(&json!({
                "status": status,
                "session_id": session_id,
                "state_file": config.state_file.to_string_lossy()
            }));
            0
        }
        Err(e) => {
            print_error("state_error", &e.to_string(), None);
            4
        }
    }
}
