use serde::Deserialize;
use serde::Serialize;

/// One file attachment as it crosses the widget/host channel.
///
/// `payload` holds the transport encoding of the file bytes (see
/// [`crate::transport`]) so the value stays representable on a channel that
/// can only carry string/JSON-like data.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttachedFilePayload {
    /// Original filename, never empty.
    pub name: String,
    /// Declared MIME type. Empty when the source environment could not tell.
    pub mime_type: String,
    /// Byte length as reported by the source environment.
    pub size: u64,
    pub payload: String,
}

/// The atomic unit emitted per send action, wire form.
///
/// The widget guarantees `text` is already trimmed and that at least one of
/// `text` / `file` is non-empty; an entirely empty submission is never put on
/// the channel.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub text: String,
    #[serde(default)]
    pub file: Option<AttachedFilePayload>,
}

/// A file attachment after transport decoding, raw bytes in hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub payload: Vec<u8>,
}

/// A submission after [`crate::decode_submission`] normalized it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub text: String,
    pub file: Option<AttachedFile>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn payload_serializes_with_camel_case_keys() {
        let payload = SubmissionPayload {
            text: "look at this".to_string(),
            file: Some(AttachedFilePayload {
                name: "photo.png".to_string(),
                mime_type: "image/png".to_string(),
                size: 3,
                payload: "AAEC".to_string(),
            }),
        };

        let value = serde_json::to_value(&payload).expect("serialize payload");
        assert_eq!(
            value,
            serde_json::json!({
                "text": "look at this",
                "file": {
                    "name": "photo.png",
                    "mimeType": "image/png",
                    "size": 3,
                    "payload": "AAEC",
                },
            })
        );
    }

    #[test]
    fn payload_without_file_round_trips_through_json() {
        let payload = SubmissionPayload {
            text: "hello".to_string(),
            file: None,
        };

        let json = serde_json::to_string(&payload).expect("serialize payload");
        let parsed: SubmissionPayload = serde_json::from_str(&json).expect("parse payload");
        assert_eq!(parsed, payload);
    }

    #[test]
    fn missing_file_field_defaults_to_none() {
        let parsed: SubmissionPayload =
            serde_json::from_str(r#"{"text":"just text"}"#).expect("parse payload");
        assert_eq!(parsed.text, "just text");
        assert_eq!(parsed.file, None);
    }
}
