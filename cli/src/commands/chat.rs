use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinSet};

use asistente_core::payload::{CalendarForm, EmailForm};

use crate::backend::Backend;
use crate::commands::auth::open_auth_page;
use crate::config::Config;
use crate::controller::{Controller, Modal, Outcome};
use crate::util::print_error;

const HELP: &str = "\
Type a message and press Enter to talk to the agent.
  /email          compose an email
  /event          create a calendar event
  /reset          start a new conversation (new session id)
  /session        show the session id
  /login          open Google sign-in in the browser
  /export <path>  write the conversation as HTML
  /help           this help
  /quit           leave
Inside a form: Enter keeps the value in [brackets], '-' clears it, /cancel closes the form.
Start a message with // to send a line that begins with '/'.";

#[derive(Debug, PartialEq, Eq)]
pub enum ChatCommand {
    Say(String),
    Email,
    Event,
    Reset,
    Session,
    Login,
    Export(PathBuf),
    Help,
    Quit,
    Unknown(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return ChatCommand::Say(line.to_string());
        };
        if rest.starts_with('/') {
            return ChatCommand::Say(rest.to_string());
        }
        let (name, arg) = rest
            .split_once(char::is_whitespace)
            .map(|(name, arg)| (name, arg.trim()))
            .unwrap_or((rest, ""));
        match name {
            "email" => ChatCommand::Email,
            "event" | "calendar" => ChatCommand::Event,
            "reset" => ChatCommand::Reset,
            "session" => ChatCommand::Session,
            "login" => ChatCommand::Login,
            "export" if !arg.is_empty() => ChatCommand::Export(PathBuf::from(arg)),
            "help" | "?" => ChatCommand::Help,
            "quit" | "exit" => ChatCommand::Quit,
            _ => ChatCommand::Unknown(trimmed.to_string()),
        }
    }
}

struct FormField {
    label: &'static str,
    value: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PromptStep {
    Ask(String),
    Complete,
    Cancelled,
}

/// Field-by-field entry of one modal form.
pub struct FormPrompt {
    modal: Modal,
    fields: Vec<FormField>,
    index: usize,
}

impl FormPrompt {
    pub fn email(form: &EmailForm) -> Self {
        Self::new(
            Modal::Email,
            vec![
                ("To", form.to.clone()),
                ("Subject", form.subject.clone()),
                ("Body", form.body.clone()),
            ],
        )
    }

    pub fn calendar(form: &CalendarForm) -> Self {
        Self::new(
            Modal::Calendar,
            vec![
                ("Summary", form.summary.clone()),
                ("Description (optional)", form.description.clone()),
                ("Start (YYYY-MM-DDTHH:MM)", form.start.clone()),
                ("End (YYYY-MM-DDTHH:MM)", form.end.clone()),
            ],
        )
    }

    fn new(modal: Modal, fields: Vec<(&'static str, String)>) -> Self {
        Self {
            modal,
            fields: fields
                .into_iter()
                .map(|(label, value)| FormField { label, value })
                .collect(),
            index: 0,
        }
    }

    pub fn modal(&self) -> Modal {
        self.modal
    }

    pub fn prompt(&self) -> String {
        let field = &self.fields[self.index];
        if field.value.is_empty() {
            format!("{}: ", field.label)
        } else {
            format!("{} [{}]: ", field.label, field.value)
        }
    }

    pub fn accept(&mut self, line: &str) -> PromptStep {
        let input = line.trim();
        if input == "/cancel" {
            return PromptStep::Cancelled;
        }
        match input {
            "" => {}
            "-" => self.fields[self.index].value.clear(),
            _ => self.fields[self.index].value = line.to_string(),
        }
        self.index += 1;
        if self.index == self.fields.len() {
            PromptStep::Complete
        } else {
            PromptStep::Ask(self.prompt())
        }
    }

    fn value(&self, i: usize) -> String {
        self.fields[i].value.clone()
    }

    pub fn email_form(&self) -> EmailForm {
        EmailForm {
            to: self.value(0),
            subject: self.value(1),
            body: self.value(2),
        }
    }

    pub fn calendar_form(&self) -> CalendarForm {
        CalendarForm {
            summary: self.value(0),
            description: self.value(1),
            start: self.value(2),
            end: self.value(3),
        }
    }
}

fn ask(prompt: &str) {
    let mut out = std::io::stdout().lock();
    let _ = write!(out, "{prompt}");
    let _ = out.flush();
}

/// Copy the prompt's values into the controller's form.
fn store_form<B: Backend>(controller: &Controller<B>, prompt: &FormPrompt) {
    match prompt.modal() {
        Modal::Email => controller.set_email_form(prompt.email_form()),
        Modal::Calendar => controller.set_calendar_form(prompt.calendar_form()),
    }
}

fn spawn_submit<B: Backend>(tasks: &mut JoinSet<()>, controller: &Arc<Controller<B>>, modal: Modal) {
    let controller = Arc::clone(controller);
    tasks.spawn(async move {
        let outcome = match modal {
            Modal::Email => controller.submit_email().await,
            Modal::Calendar => controller.submit_event().await,
        };
        if matches!(outcome, Outcome::Ignored) {
            eprintln!("(a required field is empty, nothing was sent; reopen the form to fix it)");
        }
    });
}

fn spawn_send<B: Backend>(tasks: &mut JoinSet<()>, controller: &Arc<Controller<B>>, text: String) {
    if text.trim().is_empty() {
        return;
    }
    let controller = Arc::clone(controller);
    tasks.spawn(async move {
        if matches!(controller.send_message(&text).await, Outcome::Ignored) {
            eprintln!("(still waiting for the previous reply, message not sent)");
        }
    });
}

fn report_join(result: Result<(), JoinError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "submission task did not complete");
        print_error("internal_error", &format!("a request task failed: {e}"), None);
    }
}

/// Interactive loop. Each submission runs as its own task so input keeps
/// flowing while requests are in flight.
pub async fn run<B: Backend>(controller: Arc<Controller<B>>, config: &Config) -> i32 {
    eprintln!("asistente: {}", config.api_base());
    eprintln!("session {}  (/help for commands)", controller.session_id());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks: JoinSet<()> = JoinSet::new();
    let mut form: Option<FormPrompt> = None;
    let mut exit_code = 0;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                print_error("io_error", &format!("failed to read input: {e}"), None);
                exit_code = 3;
                break;
            }
        };
        while let Some(result) = tasks.try_join_next() {
            report_join(result);
        }

        if let Some(mut prompt) = form.take() {
            match prompt.accept(&line) {
                PromptStep::Ask(question) => {
                    ask(&question);
                    form = Some(prompt);
                }
                PromptStep::Cancelled => {
                    store_form(&controller, &prompt);
                    controller.close_modal();
                    eprintln!("(form closed)");
                }
                PromptStep::Complete => {
                    store_form(&controller, &prompt);
                    spawn_submit(&mut tasks, &controller, prompt.modal());
                }
            }
            continue;
        }

        match ChatCommand::parse(&line) {
            ChatCommand::Say(text) => spawn_send(&mut tasks, &controller, text),
            ChatCommand::Email => {
                controller.open_email();
                let prompt = FormPrompt::email(&controller.email_form());
                ask(&prompt.prompt());
                form = Some(prompt);
            }
            ChatCommand::Event => {
                controller.open_calendar();
                let prompt = FormPrompt::calendar(&controller.calendar_form());
                ask(&prompt.prompt());
                form = Some(prompt);
            }
            ChatCommand::Reset => {
                if let Err(e) = controller.reset_conversation() {
                    print_error("state_error", &e.to_string(), None);
                }
            }
            ChatCommand::Session => println!("session {}", controller.session_id()),
            ChatCommand::Login => {
                open_auth_page(config);
                eprintln!("Then store the session cookie: asistente login --cookie '<name>=<value>'");
            }
            ChatCommand::Export(path) => {
                match std::fs::write(&path, controller.transcript().render_html()) {
                    Ok(()) => eprintln!("(transcript written to {})", path.display()),
                    Err(e) => print_error(
                        "io_error",
                        &format!("failed to write {}: {e}", path.display()),
                        None,
                    ),
                }
            }
            ChatCommand::Help => println!("{HELP}"),
            ChatCommand::Quit => break,
            ChatCommand::Unknown(command) => {
                eprintln!("unknown command '{command}' (/help lists commands)")
            }
        }
    }

    // Let requests already issued finish; there is no cancellation.
    while let Some(result) = tasks.join_next().await {
        report_join(result);
    }
    exit_code
}
