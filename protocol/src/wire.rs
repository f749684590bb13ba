//! The typed message channel between the input widget and its host.

use serde::Deserialize;
use serde::Serialize;

use crate::submission::SubmissionPayload;

/// Requests sent from the input widget's surface to the host application.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Op {
    /// A completed send action. Emitted exactly once per valid send.
    SubmitMessage { payload: SubmissionPayload },
    /// Drop the session's conversation history.
    ClearHistory,
    /// End of session; the host stops draining ops after this.
    Shutdown,
}

/// Events sent from the host application back to the widget's surface.
#[non_exhaustive]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The host accepted a submission and is waiting on the model.
    TurnStarted,
    /// Assistant reply for the most recent submission.
    AssistantMessage { text: String },
    /// A submission-scoped failure (decode error, endpoint error). Never
    /// fatal to the session.
    TurnError { message: String },
}
