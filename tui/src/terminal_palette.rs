//! Concrete ambient probe backed by the terminal.
//!
//! The background sample comes from the OSC 11 color query over `/dev/tty`;
//! terminals known not to answer are gated off so the query cannot stall the
//! startup path. The system-level preference signal is the `COLORFGBG`
//! environment variable set by several terminal emulators.

use std::env;
use std::time::Duration;

use crate::theme::AmbientColorProbe;
use crate::theme::Rgb;
use crate::theme::ThemeMode;
use crate::theme::classify_background;

const ANSI_16_TO_RGB: [Rgb; 16] = [
    (0, 0, 0),
    (205, 0, 0),
    (0, 205, 0),
    (205, 205, 0),
    (0, 0, 205),
    (205, 0, 205),
    (0, 205, 205),
    (229, 229, 229),
    (127, 127, 127),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (92, 92, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

/// Probe that reads the ambient signals from the hosting terminal.
#[derive(Debug, Default)]
pub struct TerminalProbe;

impl AmbientColorProbe for TerminalProbe {
    fn sample_background(&self) -> Option<Rgb> {
        if !osc_background_query_supported() {
            return None;
        }
        query_osc_background_color()
    }

    fn system_prefers_dark(&self) -> Option<bool> {
        let rgb = parse_colorfgbg(&env::var("COLORFGBG").ok()?)?;
        Some(classify_background(rgb) == ThemeMode::Dark)
    }
}

fn osc_background_query_supported() -> bool {
    // Multiplexers intercept OSC queries and rarely forward the reply.
    if env::var("TMUX").is_ok() || env::var("STY").is_ok() {
        return false;
    }

    let term = env::var("TERM").unwrap_or_default();
    if term.is_empty() {
        return false;
    }
    let term_lower = term.to_ascii_lowercase();

    const UNSUPPORTED_PREFIXES: [&str; 2] = ["screen", "tmux"];
    if UNSUPPORTED_PREFIXES
        .iter()
        .any(|prefix| term_lower.starts_with(prefix))
    {
        return false;
    }

    const UNSUPPORTED_TERMS: [&str; 5] = ["dumb", "linux", "vt100", "xterm-color", "ansi"];
    !UNSUPPORTED_TERMS.contains(&term_lower.as_str())
}

#[cfg(unix)]
fn query_osc_background_color() -> Option<Rgb> {
    use std::fs::OpenOptions;
    use std::io::Write;

    let mut tty_w = OpenOptions::new().write(true).open("/dev/tty").ok()?;
    let mut tty_r = OpenOptions::new().read(true).open("/dev/tty").ok()?;

    tty_w.write_all(b"\x1b]11;?\x07").ok()?;
    tty_w.flush().ok()?;

    let reply = read_osc_reply(&mut tty_r, Duration::from_millis(150))?;
    parse_osc_rgb(&String::from_utf8_lossy(&reply))
}

#[cfg(not(unix))]
fn query_osc_background_color() -> Option<Rgb> {
    None
}

#[cfg(unix)]
fn read_osc_reply(tty: &mut std::fs::File, timeout: Duration) -> Option<Vec<u8>> {
    use std::io::Read;
    use std::time::Instant;

    set_nonblocking(tty);

    let start = Instant::now();
    let mut buf = [0u8; 256];
    let mut data = Vec::new();

    while start.elapsed() < timeout {
        match tty.read(&mut buf) {
            Ok(n) if n > 0 => {
                data.extend_from_slice(&buf[..n]);
                // A reply terminates with BEL or ST.
                let has_bel = data.contains(&b'\x07');
                let has_st = data.windows(2).any(|w| w == b"\x1b\\");
                if has_bel || has_st {
                    break;
                }
            }
            _ => std::thread::sleep(Duration::from_millis(10)),
        }
    }

    if data.is_empty() { None } else { Some(data) }
}

#[cfg(unix)]
fn set_nonblocking(tty: &std::fs::File) {
    use std::os::unix::io::AsRawFd;

    let fd = tty.as_raw_fd();
    if fd != -1 {
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL, 0) };
        if flags != -1 {
            unsafe {
                libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
            }
        }
    }
}

/// Parse an OSC 11 reply such as `\x1b]11;rgb:2828/2c2c/3434\x07`.
fn parse_osc_rgb(reply: &str) -> Option<Rgb> {
    let start = reply.find("]11;")?;
    let payload = &reply[start + 4..];
    let payload = payload.trim_start_matches('?');
    let end = payload
        .find('\u{7}')
        .or_else(|| payload.find("\x1b\\"))
        .unwrap_or(payload.len());
    let payload = &payload[..end];

    if let Some(rest) = payload
        .strip_prefix("rgb:")
        .or_else(|| payload.strip_prefix("rgba:"))
    {
        let mut parts = rest.split('/');
        let r = parse_component(parts.next()?)?;
        let g = parse_component(parts.next()?)?;
        let b = parse_component(parts.next()?)?;
        return Some((r, g, b));
    }

    if let Some(hex) = payload.strip_prefix('#')
        && hex.len() >= 6
    {
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        return Some((r, g, b));
    }

    None
}

/// Color components arrive as 8-bit (`d6`) or 16-bit (`d6d6`) hex.
fn parse_component(component: &str) -> Option<u8> {
    let trimmed = component.trim();
    match trimmed.len() {
        2 => u8::from_str_radix(trimmed, 16).ok(),
        4 => u16::from_str_radix(trimmed, 16)
            .ok()
            .map(|value| ((u32::from(value) * 255 + 32_767) / 65_535) as u8),
        _ => None,
    }
}

/// `COLORFGBG` looks like `15;0` or `15;default;0`; the last segment is the
/// background color index.
fn parse_colorfgbg(raw: &str) -> Option<Rgb> {
    let bg_part = raw.split(';').filter(|segment| !segment.is_empty()).last()?;
    if bg_part.eq_ignore_ascii_case("default") {
        return None;
    }
    let idx = bg_part.parse::<u32>().ok()?;
    xterm_color_to_rgb(idx)
}

fn xterm_color_to_rgb(idx: u32) -> Option<Rgb> {
    if idx <= 15 {
        return Some(ANSI_16_TO_RGB[idx as usize]);
    }
    if (16..=231).contains(&idx) {
        let idx = idx - 16;
        let r = idx / 36;
        let g = (idx % 36) / 6;
        let b = idx % 6;
        let to_component = |v: u32| if v == 0 { 0 } else { 55 + v * 40 };
        return Some((
            to_component(r) as u8,
            to_component(g) as u8,
            to_component(b) as u8,
        ));
    }
    if (232..=255).contains(&idx) {
        let level = ((idx - 232) * 10 + 8) as u8;
        return Some((level, level, level));
    }
    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_sixteen_bit_rgb_reply() {
        assert_eq!(
            parse_osc_rgb("\x1b]11;rgb:1414/1414/1818\x07"),
            Some((20, 20, 24))
        );
    }

    #[test]
    fn parses_eight_bit_rgb_reply_with_st_terminator() {
        assert_eq!(parse_osc_rgb("\x1b]11;rgb:f0/f2/f6\x1b\\"), Some((0xF0, 0xF2, 0xF6)));
    }

    #[test]
    fn parses_rgba_and_hex_replies() {
        assert_eq!(
            parse_osc_rgb("\x1b]11;rgba:ffff/ffff/ffff\x07"),
            Some((255, 255, 255))
        );
        assert_eq!(parse_osc_rgb("\x1b]11;#262730\x07"), Some((0x26, 0x27, 0x30)));
    }

    #[test]
    fn rejects_garbage_replies() {
        assert_eq!(parse_osc_rgb("no osc here"), None);
        assert_eq!(parse_osc_rgb("\x1b]11;rgb:zz/zz/zz\x07"), None);
    }

    #[test]
    fn scales_sixteen_bit_components() {
        assert_eq!(parse_component("0000"), Some(0));
        assert_eq!(parse_component("ffff"), Some(255));
        assert_eq!(parse_component("8080"), Some(128));
    }

    #[test]
    fn colorfgbg_uses_last_segment_as_background() {
        assert_eq!(parse_colorfgbg("15;0"), Some((0, 0, 0)));
        assert_eq!(parse_colorfgbg("0;default;15"), Some((255, 255, 255)));
        assert_eq!(parse_colorfgbg("15;default"), None);
        assert_eq!(parse_colorfgbg(""), None);
    }

    #[test]
    fn xterm_cube_and_grayscale_mapping() {
        assert_eq!(xterm_color_to_rgb(0), Some((0, 0, 0)));
        assert_eq!(xterm_color_to_rgb(15), Some((255, 255, 255)));
        assert_eq!(xterm_color_to_rgb(16), Some((0, 0, 0)));
        assert_eq!(xterm_color_to_rgb(231), Some((255, 255, 255)));
        assert_eq!(xterm_color_to_rgb(232), Some((8, 8, 8)));
        assert_eq!(xterm_color_to_rgb(255), Some((238, 238, 238)));
        assert_eq!(xterm_color_to_rgb(256), None);
    }
}
