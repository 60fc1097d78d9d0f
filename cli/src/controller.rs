use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeZone};
use thiserror::Error;

use asistente_core::datetime::{DateTimeError, default_event_window};
use asistente_core::error::RequestError;
use asistente_core::message::{Message, Transcript};
use asistente_core::payload::{CalendarForm, EmailForm, InvokeRequest};

use crate::backend::Backend;
use crate::session::SessionManager;
use crate::store::StoreError;
use crate::view::View;

pub const STATUS_THINKING: &str = "Thinking…";
pub const STATUS_SENDING_EMAIL: &str = "Sending email…";
pub const STATUS_CREATING_EVENT: &str = "Creating event…";
pub const NO_RESPONSE: &str = "[No response]";

const INVOKE_FAILED: &str = "Error invoking the agent";
const EMAIL_FAILED: &str = "Error sending email";
const EVENT_FAILED: &str = "Error creating event";

/// Form currently shown on top of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    Email,
    Calendar,
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    DateTime(#[from] DateTimeError),
}

impl FlowError {
    pub fn exit_code(&self) -> i32 {
        match self {
            FlowError::Request(e) => e.exit_code(),
            FlowError::DateTime(_) => 4,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::Request(e) => e.kind(),
            FlowError::DateTime(_) => "invalid_datetime",
        }
    }
}

/// Result of one user action.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing was sent: blank input, a required field missing, or a chat
    /// send already in flight.
    Ignored,
    /// The backend accepted the request. Carries the agent message appended.
    Done(Message),
    /// The request failed. Carries the warning message appended.
    Failed { message: Message, error: FlowError },
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Holds the chat in-flight flag; clears it on drop.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Conversation state plus the three request flows. Shared behind an `Arc`
/// by the interactive loop; every lock is released before awaiting.
pub struct Controller<B> {
    backend: B,
    view: Arc<dyn View>,
    sessions: Mutex<SessionManager>,
    session_id: Mutex<String>,
    transcript: Mutex<Transcript>,
    status: Mutex<String>,
    sending: AtomicBool,
    modal: Mutex<Option<Modal>>,
    email_form: Mutex<EmailForm>,
    calendar_form: Mutex<CalendarForm>,
    timezone_label: String,
}

impl<B: Backend> Controller<B> {
    pub fn new(
        backend: B,
        mut sessions: SessionManager,
        view: Arc<dyn View>,
        timezone_label: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let session_id = sessions.get_or_create()?;
        Ok(Self {
            backend,
            view,
            sessions: Mutex::new(sessions),
            session_id: Mutex::new(session_id),
            transcript: Mutex::new(Transcript::new()),
            status: Mutex::new(String::new()),
            sending: AtomicBool::new(false),
            modal: Mutex::new(None),
            email_form: Mutex::new(EmailForm::default()),
            calendar_form: Mutex::new(CalendarForm::default()),
            timezone_label: timezone_label.into(),
        })
    }

    pub fn session_id(&self) -> String {
        lock(&self.session_id).clone()
    }

    pub fn transcript(&self) -> Transcript {
        lock(&self.transcript).clone()
    }

    pub fn status(&self) -> String {
        lock(&self.status).clone()
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    pub fn modal(&self) -> Option<Modal> {
        *lock(&self.modal)
    }

    /// Record and display under one lock so the view shows messages in
    /// transcript order.
    fn append(&self, message: Message) {
        let mut transcript = lock(&self.transcript);
        self.view.append(&message);
        transcript.push(message);
    }

    fn set_status(&self, text: &str) {
        *lock(&self.status) = text.to_string();
        self.view.set_status(text);
    }

    fn fail(&self, what: &str, error: FlowError) -> Outcome {
        tracing::warn!(error = %error, "{what}");
        let message = Message::agent(format!("⚠️ {what}: {error}"));
        self.append(message.clone());
        Outcome::Failed { message, error }
    }

    /// Drop the stored session id, create a new one and clear the conversation.
    /// Server-side state for the old id is left alone.
    pub fn reset_conversation(&self) -> Result<String, StoreError> {
        let id = lock(&self.sessions).reset()?;
        *lock(&self.session_id) = id.clone();
        lock(&self.transcript).clear();
        self.view.clear();
        self.set_status(&format!("New session: {id}"));
        tracing::info!(session_id = %id, "conversation reset");
        Ok(id)
    }

    /// Send one chat turn. Ignored when blank or while another send is in flight.
    pub async fn send_message(&self, input: &str) -> Outcome {
        let text = input.trim();
        if text.is_empty() {
            return Outcome::Ignored;
        }
        let Some(_in_flight) = InFlight::try_acquire(&self.sending) else {
            tracing::debug!("chat send ignored, previous one still in flight");
            return Outcome::Ignored;
        };

        self.append(Message::user(text));
        self.set_status(STATUS_THINKING);

        let request = InvokeRequest {
            session_id: self.session_id(),
            input: text.to_string(),
        };
        let outcome = match self.backend.invoke(&request).await {
            Ok(resp) => {
                let reply = resp
                    .output
                    .filter(|o| !o.is_empty())
                    .unwrap_or_else(|| NO_RESPONSE.to_string());
                let message = Message::agent(reply);
                self.append(message.clone());
                Outcome::Done(message)
            }
            Err(e) => self.fail(INVOKE_FAILED, e.into()),
        };

        self.set_status("");
        outcome
    }

    pub fn open_email(&self) {
        *lock(&self.modal) = Some(Modal::Email);
    }

    /// Hide the current form. Field values are kept.
    pub fn close_modal(&self) {
        *lock(&self.modal) = None;
    }

    pub fn email_form(&self) -> EmailForm {
        lock(&self.email_form).clone()
    }

    pub fn set_email_form(&self, form: EmailForm) {
        *lock(&self.email_form) = form;
    }

    /// Submit the email form. On success the form is cleared and closed; on
    /// failure it stays as typed.
    pub async fn submit_email(&self) -> Outcome {
        let Some(payload) = self.email_form().to_payload() else {
            return Outcome::Ignored;
        };

        self.set_status(STATUS_SENDING_EMAIL);
        let outcome = match self.backend.send_email(&payload).await {
            Ok(()) => {
                let message = Message::agent(format!("✅ Email sent to {}", payload.to));
                self.append(message.clone());
                self.close_modal();
                lock(&self.email_form).clear();
                Outcome::Done(message)
            }
            Err(e) => self.fail(EMAIL_FAILED, e.into()),
        };

        self.set_status("");
        outcome
    }

    pub fn open_calendar(&self) {
        self.open_calendar_at(&Local::now());
    }

    /// Show the calendar form with start = `now` and end = `now` + 1h.
    pub fn open_calendar_at<Tz: TimeZone>(&self, now: &DateTime<Tz>)
    where
        Tz::Offset: Display,
    {
        let (start, end) = default_event_window(now);
        {
            let mut form = lock(&self.calendar_form);
            form.start = start;
            form.end = end;
        }
        *lock(&self.modal) = Some(Modal::Calendar);
    }

    pub fn calendar_form(&self) -> CalendarForm {
        lock(&self.calendar_form).clone()
    }

    pub fn set_calendar_form(&self, form: CalendarForm) {
        *lock(&self.calendar_form) = form;
    }

    /// Submit the calendar form, converting times with the machine's local offset.
    pub async fn submit_event(&self) -> Outcome {
        self.submit_event_in(&Local).await
    }

    /// Submit the calendar form, converting times with `zone`'s offset.
    pub async fn submit_event_in<Tz>(&self, zone: &Tz) -> Outcome
    where
        Tz: TimeZone + Sync,
        Tz::Offset: Display,
    {
        let payload = match self.calendar_form().to_payload(zone, &self.timezone_label) {
            Ok(Some(payload)) => payload,
            Ok(None) => return Outcome::Ignored,
            Err(e) => return self.fail(EVENT_FAILED, e.into()),
        };

        self.set_status(STATUS_CREATING_EVENT);
        let outcome = match self.backend.create_event(&payload).await {
            Ok(()) => {
                let message = Message::agent(format!(
                    "✅ Event created: {} ({} → {})",
                    payload.summary, payload.start_datetime, payload.end_datetime
                ));
                self.append(message.clone());
                self.close_modal();
                lock(&self.calendar_form).clear();
                Outcome::Done(message)
            }
            Err(e) => self.fail(EVENT_FAILED, e.into()),
        };

        self.set_status("");
        outcome
    }
}
