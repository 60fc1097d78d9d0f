use std::io::Write;

use asistente_core::message::{Message, Role};
use asistente_core::render::sanitize_terminal;

/// Where the controller shows messages and the status line.
pub trait View: Send + Sync {
    fn append(&self, message: &Message);
    fn set_status(&self, status: &str);
    fn clear(&self);
}

/// Prints agent messages on stdout and the status line on stderr.
pub struct TerminalView {
    /// Echo user messages too. Off in the interactive loop, where the user
    /// already sees what they typed.
    pub echo_user: bool,
}

impl View for TerminalView {
    fn append(&self, message: &Message) {
        if message.role == Role::User && !self.echo_user {
            return;
        }
        let mut out = std::io::stdout().lock();
        let _ = writeln!(
            out,
            "{}: {}",
            message.role.label(),
            sanitize_terminal(&message.text)
        );
        let _ = out.flush();
    }

    fn set_status(&self, status: &str) {
        if !status.is_empty() {
            eprintln!("… {}", sanitize_terminal(status));
        }
    }

    fn clear(&self) {
        println!("──────── conversation cleared ────────");
    }
}

/// Discards everything. One-shot commands print their own JSON instead.
pub struct NullView;

impl View for NullView {
    fn append(&self, _message: &Message) {}
    fn set_status(&self, _status: &str) {}
    fn clear(&self) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every view update for assertions.
    #[derive(Default)]
    pub struct RecordingView {
        pub messages: Mutex<Vec<Message>>,
        pub statuses: Mutex<Vec<String>>,
        pub clears: Mutex<usize>,
    }

    impl View for RecordingView {
        fn append(&self, message: &Message) {
            self.messages.lock().unwrap().push(message.clone());
        }

        fn set_status(&self, status: &str) {
            self.statuses.lock().unwrap().push(status.to_string());
        }

        fn clear(&self) {
            *self.clears.lock().unwrap() += 1;
            self.messages.lock().unwrap().clear();
        }
    }
}
