//! Conversation workflow
//!
//! Owns the transcript for one chat session and the single-flight send state
//! machine around it. The transcript is append-only: no message is ever
//! edited or removed once appended, and failed sends stay visible as an
//! unanswered user turn. Errors surface through a separate slot, never as
//! transcript entries.
//!
//! A send is split in two halves so the unary driver and the streaming CLI
//! loop share one invariant-preserving core: [`ConversationWorkflow::begin_send`]
//! guards and appends the user turn, [`ConversationWorkflow::complete_send`]
//! lands the reply or the error.

use std::fmt;

use crate::api::error::ApiError;
use crate::api::{ChatClient, ChatMessage};
use crate::core::constants::GREETING;

/// Monotonic, session-scoped message identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

/// One immutable transcript entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub author: Author,
    pub text: String,
}

/// Send state: at most one request may be outstanding per workflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendState {
    Idle,
    Sending,
}

/// How a [`ConversationWorkflow::submit`] call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The transcript gained an assistant reply.
    Replied,
    /// The send failed; the error slot holds the cause.
    Failed,
    /// Blank input or a send already in flight; nothing changed.
    Rejected,
}

pub struct ConversationWorkflow {
    transcript: Vec<Message>,
    state: SendState,
    last_error: Option<ApiError>,
    next_id: u64,
    greeting_id: MessageId,
}

impl ConversationWorkflow {
    /// Start a session. The transcript is seeded with a synthetic assistant
    /// greeting that is shown to the user but excluded from provider
    /// context.
    pub fn new() -> Self {
        Self::with_greeting(GREETING)
    }

    pub fn with_greeting(greeting: &str) -> Self {
        let mut workflow = Self {
            transcript: Vec::new(),
            state: SendState::Idle,
            last_error: None,
            next_id: 0,
            greeting_id: MessageId(0),
        };
        workflow.greeting_id = workflow.append(Author::Assistant, greeting);
        workflow
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn state(&self) -> SendState {
        self.state
    }

    /// The latest surfaced error, if the most recent send failed. Cleared on
    /// the next accepted send.
    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    /// First half of a send: reject blank input and double submits, clear
    /// the error slot, append the user turn, enter `Sending`, and hand back
    /// the provider history.
    ///
    /// Returns `None` without any state change when the input is
    /// empty/whitespace-only or a request is already in flight. The user
    /// message is appended before any network activity, so the user always
    /// sees their own turn immediately regardless of outcome.
    pub fn begin_send(&mut self, text: &str) -> Option<Vec<ChatMessage>> {
        if text.trim().is_empty() || self.state == SendState::Sending {
            return None;
        }
        self.last_error = None;
        self.append(Author::User, text);
        self.state = SendState::Sending;
        Some(self.provider_history())
    }

    /// Second half of a send: append the assistant reply or surface the
    /// error, then return to `Idle`. The user turn from `begin_send` is
    /// never rolled back.
    pub fn complete_send(&mut self, result: Result<String, ApiError>) {
        debug_assert_eq!(self.state, SendState::Sending);
        match result {
            Ok(reply) => {
                self.append(Author::Assistant, &reply);
            }
            Err(err) => {
                self.last_error = Some(err);
            }
        }
        self.state = SendState::Idle;
    }

    /// Drive one full submit cycle against `client`.
    pub async fn submit(
        &mut self,
        client: &dyn ChatClient,
        model_id: &str,
        text: &str,
    ) -> SubmitOutcome {
        let Some(history) = self.begin_send(text) else {
            return SubmitOutcome::Rejected;
        };
        let result = client.send_message(model_id, history).await;
        let replied = result.is_ok();
        self.complete_send(result);
        if replied {
            SubmitOutcome::Replied
        } else {
            SubmitOutcome::Failed
        }
    }

    fn append(&mut self, author: Author, text: &str) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.transcript.push(Message {
            id,
            author,
            text: text.to_string(),
        });
        id
    }

    /// The full transcript through the just-appended user turn, in order,
    /// minus the synthetic greeting. No truncation or summarization; the
    /// provider's own limits apply.
    fn provider_history(&self) -> Vec<ChatMessage> {
        self.transcript
            .iter()
            .filter(|message| message.id != self.greeting_id)
            .map(|message| match message.author {
                Author::User => ChatMessage::user(&message.text),
                Author::Assistant => ChatMessage::assistant(&message.text),
            })
            .collect()
    }
}

impl Default for ConversationWorkflow {
    fn default() -> Self {
        Self::new()
    }
}
