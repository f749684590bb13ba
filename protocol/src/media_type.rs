//! Media type resolution for attachments.

/// Resolve the media type of an attachment: the declared type wins, an
/// extension lookup covers sources that report none.
pub fn resolve_media_type(declared: &str, file_name: &str) -> String {
    if !declared.is_empty() {
        return declared.to_string();
    }

    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let resolved = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "md" => "text/markdown",
        "html" => "text/html",
        "xml" => "application/xml",
        _ => "application/octet-stream",
    };
    resolved.to_string()
}

/// `image/*` attachments become image content blocks on the provider side;
/// everything else travels as a document.
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type.starts_with("image/")
}
