pub mod auth;
pub mod chat;
pub mod email;
pub mod event;
pub mod send;
pub mod session;

use serde_json::Value;

use asistente_core::message::Message;

use crate::controller::{FlowError, Outcome};
use crate::util::{print_error, print_json, report_request_error};

/// Turn a one-shot outcome into JSON output and an exit code.
pub(crate) fn finish(
    outcome: Outcome,
    ignored_reason: &str,
    on_done: impl FnOnce(&Message) -> Value,
) -> i32 {
    match outcome {
        Outcome::Done(message) => {
            print_json(&on_done(&message));
            0
        }
        Outcome::Ignored => {
            print_error("validation_failed", ignored_reason, None);
            4
        }
        Outcome::Failed { error, .. } => report_flow_error(&error),
    }
}

pub(crate) fn report_flow_error(error: &FlowError) -> i32 {
    match error {
        FlowError::Request(e) => report_request_error(e),
        FlowError::DateTime(e) => {
            print_error(error.kind(), &e.to_string(), Some("Use YYYY-MM-DDTHH:MM, e.g. 2024-06-01T10:00"));
            error.exit_code()
        }
    }
}
