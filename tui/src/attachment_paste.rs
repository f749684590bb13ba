//! Turning pasted text into attachment candidates.
//!
//! A terminal has no file chooser; selecting a file means pasting (or
//! dropping, which terminals deliver as a paste) its path into the composer.

use std::path::Path;
use std::path::PathBuf;

/// Normalize pasted text that may represent a filesystem path.
///
/// Supports:
/// - `file://` URLs (converted to local paths)
/// - shell-escaped paths (via `shlex`)
///
/// When the paste splits into several tokens, only the first is used; a
/// multi-selection drag collapses to its first file rather than failing.
pub fn normalize_pasted_path(pasted: &str) -> Option<PathBuf> {
    let pasted = pasted.trim();
    if pasted.is_empty() || pasted.contains('\n') {
        return None;
    }

    // file:// URL → filesystem path
    if let Ok(url) = url::Url::parse(pasted)
        && url.scheme() == "file"
    {
        return url.to_file_path().ok();
    }

    let mut parts = shlex::Shlex::new(pasted);
    parts.next().map(PathBuf::from)
}

/// Resolve a paste to an existing regular file, if that is what it names.
pub fn pasted_file_path(pasted: &str) -> Option<PathBuf> {
    let path = normalize_pasted_path(pasted)?;
    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() => Some(path),
        _ => None,
    }
}

/// Byte length of a file as reported by the filesystem.
pub fn file_size(path: &Path) -> std::io::Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}
