//! Application-level events used to coordinate UI actions.

use std::path::PathBuf;

#[derive(Debug)]
pub enum AppEvent {
    /// Ask the app to read and transport-encode an attachment's bytes off the
    /// UI loop. Sent by the composer the moment a file is selected.
    StartAttachmentEncode {
        attachment_id: u64,
        path: PathBuf,
    },

    /// A finished encode. `result` carries the transport payload, or a
    /// human-readable description of why reading/encoding failed. The
    /// composer discards results whose `attachment_id` no longer matches the
    /// current attachment slot.
    AttachmentEncoded {
        attachment_id: u64,
        result: Result<String, String>,
    },

    /// An attachment was dropped because its bytes could not be read or
    /// encoded; surface a notice in the transcript.
    AttachmentFailed { name: String, message: String },

    ExitRequest,
}
