use serde::{Deserialize, Serialize};

use crate::render::escape_html;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Agent => "agent",
        }
    }

    /// Label shown under a message bubble.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Agent => "Agent",
        }
    }
}

/// A single chat message. Immutable once appended to a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            text: text.into(),
        }
    }

    /// Render as one list item. The text is always escaped.
    pub fn render_html(&self) -> String {
        format!(
            r#"<li class="msg {}"><div class="bubble">{}</div><div class="meta">{}</div></li>"#,
            self.role.as_str(),
            escape_html(&self.text),
            self.role.label()
        )
    }
}

/// Append-only, chronological list of messages. Only bulk clearing is allowed.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Render the whole transcript as an HTML `<ul>`, top to bottom.
    pub fn render_html(&self) -> String {
        let mut out = String::from("<ul id=\"messages\">\n");
        for message in &self.messages {
            out.push_str("  ");
            out.push_str(&message.render_html());
            out.push('\n');
        }
        out.push_str("</ul>\n");
        out
    }
}
