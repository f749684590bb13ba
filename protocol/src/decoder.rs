//! Host-side normalization of received channel payloads.

use thiserror::Error;

use crate::submission::AttachedFile;
use crate::submission::Submission;
use crate::submission::SubmissionPayload;
use crate::transport;
use crate::transport::TransportDecodeError;

/// Failure to normalize a received submission.
///
/// A payload that claims a file but carries malformed content is surfaced to
/// the host as an error tied to that submission; silently dropping the file
/// or substituting empty bytes would lose data without anyone noticing.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("attachment `{name}` could not be decoded: {source}")]
    FilePayload {
        name: String,
        #[source]
        source: TransportDecodeError,
    },
}

/// Normalize a raw channel payload into a [`Submission`].
///
/// `None` is the "no submission yet" sentinel and maps to `Ok(None)`. The
/// decoder owns no state; each invocation is a pure transform of the payload
/// it is given.
pub fn decode_submission(
    payload: Option<SubmissionPayload>,
) -> Result<Option<Submission>, DecodeError> {
    let Some(payload) = payload else {
        return Ok(None);
    };

    let file = match payload.file {
        Some(file) => {
            let bytes =
                transport::decode(&file.payload).map_err(|source| DecodeError::FilePayload {
                    name: file.name.clone(),
                    source,
                })?;
            Some(AttachedFile {
                name: file.name,
                mime_type: file.mime_type,
                size: file.size,
                payload: bytes,
            })
        }
        None => None,
    };

    Ok(Some(Submission {
        text: payload.text,
        file,
    }))
}
