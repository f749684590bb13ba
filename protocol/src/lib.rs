mod decoder;
mod media_type;
mod submission;
pub mod transport;
mod wire;

pub use decoder::DecodeError;
pub use decoder::decode_submission;
pub use media_type::is_image_media_type;
pub use media_type::resolve_media_type;
pub use submission::AttachedFile;
pub use submission::AttachedFilePayload;
pub use submission::Submission;
pub use submission::SubmissionPayload;
pub use wire::Event;
pub use wire::Op;
