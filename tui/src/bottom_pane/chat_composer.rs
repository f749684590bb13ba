//! The chat composer is the bottom-pane input state machine.
//!
//! It is responsible for:
//!
//! - Editing the input buffer (a [`TextArea`]).
//! - Holding the single attachment slot, including the asynchronous
//!   transport-encode of the attached file's bytes.
//! - Handling submit vs newline on Enter.
//! - Producing exactly one [`InputResult::Submitted`] per valid send action.
//!
//! # Attachment Encode Lifecycle
//!
//! Selecting a file stores its metadata immediately (the indicator becomes
//! visible right away) and asks the app loop, via
//! [`AppEvent::StartAttachmentEncode`], to read and transport-encode the
//! bytes off the UI loop. Every attachment carries an id from a
//! monotonically increasing sequence; when an encode completes, the result
//! is committed only if its id still matches the current slot, so an encode
//! finishing after the user picked a different file cannot clobber the newer
//! selection.
//!
//! A send that fires while the encode is still pending is parked rather
//! than raced: the submission is built and emitted from the completion
//! handler, so the file payload is never silently missing. If the encode
//! fails, the parked send is rejected, the typed text stays in the buffer,
//! and a notice is surfaced instead.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::WidgetRef;
use std::path::PathBuf;

use chatline_protocol::AttachedFilePayload;
use chatline_protocol::SubmissionPayload;
use chatline_protocol::is_image_media_type;
use chatline_protocol::resolve_media_type;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::attachment_paste;
use crate::bottom_pane::textarea::TextArea;
use crate::theme::Theme;

/// Columns reserved for the `› ` prompt prefix.
pub(crate) const LIVE_PREFIX_COLS: u16 = 2;

/// Host-supplied widget configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerConfig {
    /// Text shown while the input buffer is empty.
    pub placeholder: String,
    /// When true, all interactive controls are inert and nothing is emitted.
    pub disabled: bool,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            placeholder: "Send a message...".to_string(),
            disabled: false,
        }
    }
}

/// Result returned when the user interacts with the composer.
#[derive(Debug, PartialEq)]
pub enum InputResult {
    Submitted(SubmissionPayload),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EncodeState {
    Pending,
    Ready(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Attachment {
    id: u64,
    name: String,
    media_type: String,
    size: u64,
    payload: EncodeState,
}

pub(crate) struct ChatComposer {
    textarea: TextArea,
    config: ComposerConfig,
    attachment: Option<Attachment>,
    next_attachment_id: u64,
    /// A send arrived while the attachment was still encoding; fire it from
    /// the completion handler.
    pending_submit: bool,
    app_event_tx: AppEventSender,
}

impl ChatComposer {
    pub fn new(config: ComposerConfig, app_event_tx: AppEventSender) -> Self {
        Self {
            textarea: TextArea::new(),
            config,
            attachment: None,
            next_attachment_id: 0,
            pending_submit: false,
            app_event_tx,
        }
    }

    /// Returns true if the composer currently contains no user input.
    pub fn is_empty(&self) -> bool {
        self.textarea.is_empty() && self.attachment.is_none()
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ComposerConfig) {
        self.config = config;
    }

    pub fn attachment_name(&self) -> Option<&str> {
        self.attachment.as_ref().map(|att| att.name.as_str())
    }

    /// Handle a key event. At most one `Submitted` is returned per valid
    /// send action; everything else is `None`.
    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> InputResult {
        if key_event.kind == KeyEventKind::Release {
            return InputResult::None;
        }
        if self.config.disabled {
            return InputResult::None;
        }

        match key_event {
            KeyEvent {
                code: KeyCode::Enter,
                modifiers: KeyModifiers::NONE,
                ..
            } => self.handle_submission(),
            KeyEvent {
                code: KeyCode::Enter,
                modifiers,
                ..
            } if modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
                // A modifier on Enter signals an intentional newline.
                self.textarea.insert_str("\n");
                InputResult::None
            }
            KeyEvent {
                code: KeyCode::Char('x'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                self.remove_attachment();
                InputResult::None
            }
            input => {
                self.textarea.input(input);
                InputResult::None
            }
        }
    }

    /// Integrate pasted text: a paste that names an existing file becomes the
    /// attachment, anything else is inserted into the buffer.
    pub fn handle_paste(&mut self, pasted: String) -> bool {
        if self.config.disabled {
            return false;
        }
        if let Some(path) = attachment_paste::pasted_file_path(&pasted) {
            self.attach_file(path);
        } else {
            self.textarea.insert_str(&pasted);
        }
        true
    }

    /// Select a file: record its metadata, replace any previous attachment,
    /// and kick off the asynchronous transport-encode of its content.
    pub fn attach_file(&mut self, path: PathBuf) {
        if self.config.disabled {
            return;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            tracing::warn!("pasted path has no file name: {}", path.display());
            return;
        };
        let size = match attachment_paste::file_size(&path) {
            Ok(size) => size,
            Err(err) => {
                self.app_event_tx.send(AppEvent::AttachmentFailed {
                    name,
                    message: err.to_string(),
                });
                return;
            }
        };

        let media_type = resolve_media_type("", &name);
        if is_image_media_type(&media_type) {
            match image::image_dimensions(&path) {
                Ok((width, height)) => tracing::debug!("image dimensions={width}x{height}"),
                Err(err) => tracing::trace!("could not read image dimensions: {err}"),
            }
        }

        let id = self.next_attachment_id;
        self.next_attachment_id += 1;
        // Replacing the slot invalidates any in-flight encode for the
        // previous file; its completion will no longer match this id.
        self.attachment = Some(Attachment {
            id,
            name,
            media_type,
            size,
            payload: EncodeState::Pending,
        });
        self.app_event_tx.send(AppEvent::StartAttachmentEncode {
            attachment_id: id,
            path,
        });
    }

    /// Clear the attachment slot unconditionally. Returns true if a file was
    /// attached. Also abandons any send parked on the encode; auto-sending
    /// text-only after the user pulled the file would be surprising.
    pub fn remove_attachment(&mut self) -> bool {
        self.pending_submit = false;
        self.attachment.take().is_some()
    }

    /// Commit a finished encode. Stale results (the slot was cleared or a
    /// newer file replaced it) are discarded. May return the submission that
    /// was parked on this encode.
    pub fn on_attachment_encoded(
        &mut self,
        attachment_id: u64,
        result: Result<String, String>,
    ) -> InputResult {
        let Some(attachment) = self.attachment.as_mut() else {
            tracing::debug!("encode result for a cleared attachment discarded");
            return InputResult::None;
        };
        if attachment.id != attachment_id {
            tracing::debug!("stale encode result discarded");
            return InputResult::None;
        }

        match result {
            Ok(payload) => {
                attachment.payload = EncodeState::Ready(payload);
                if self.pending_submit && !self.config.disabled {
                    self.pending_submit = false;
                    return self.handle_submission();
                }
                InputResult::None
            }
            Err(message) => {
                let name = attachment.name.clone();
                self.attachment = None;
                self.pending_submit = false;
                self.app_event_tx
                    .send(AppEvent::AttachmentFailed { name, message });
                InputResult::None
            }
        }
    }

    fn handle_submission(&mut self) -> InputResult {
        let text = self.textarea.text().trim().to_string();

        // If there is neither text nor an attachment, suppress the send
        // entirely and leave the state untouched.
        if text.is_empty() && self.attachment.is_none() {
            return InputResult::None;
        }

        let file = match self.attachment.as_ref() {
            Some(att) => match &att.payload {
                EncodeState::Pending => {
                    // Block the send on the in-flight encode rather than
                    // racing it; the completion handler fires it.
                    self.pending_submit = true;
                    return InputResult::None;
                }
                EncodeState::Ready(payload) => Some(AttachedFilePayload {
                    name: att.name.clone(),
                    mime_type: att.media_type.clone(),
                    size: att.size,
                    payload: payload.clone(),
                }),
            },
            None => None,
        };

        self.textarea.set_text("");
        self.attachment = None;
        self.pending_submit = false;
        InputResult::Submitted(SubmissionPayload { text, file })
    }

    fn layout_areas(&self, area: Rect) -> (Option<Rect>, Rect) {
        let indicator_height = u16::from(self.attachment.is_some());
        let indicator = (indicator_height > 0 && area.height > 0)
            .then(|| Rect::new(area.x, area.y, area.width, 1));
        let textarea_rect = Rect::new(
            area.x + LIVE_PREFIX_COLS,
            area.y + indicator_height,
            area.width.saturating_sub(LIVE_PREFIX_COLS + 1),
            area.height.saturating_sub(indicator_height),
        );
        (indicator, textarea_rect)
    }

    pub fn desired_height(&self, width: u16) -> u16 {
        let indicator_height = u16::from(self.attachment.is_some());
        indicator_height
            + self
                .textarea
                .desired_height(width.saturating_sub(LIVE_PREFIX_COLS + 1))
                .max(1)
    }

    pub fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        if self.config.disabled {
            return None;
        }
        let (_, textarea_rect) = self.layout_areas(area);
        self.textarea.cursor_pos(textarea_rect)
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        if area.is_empty() {
            return;
        }
        buf.set_style(area, Style::default().bg(theme.surface).fg(theme.text));

        let (indicator_rect, textarea_rect) = self.layout_areas(area);
        if let (Some(rect), Some(att)) = (indicator_rect, self.attachment.as_ref()) {
            let status = match (&att.payload, self.pending_submit) {
                (EncodeState::Pending, true) => "sending…",
                (EncodeState::Pending, false) => "encoding…",
                (EncodeState::Ready(_), _) => "ctrl+x to remove",
            };
            let line = Line::from(vec![
                " ".into(),
                Span::styled(
                    format!(" {} ", att.name),
                    Style::default().bg(theme.accent).fg(theme.accent_text),
                ),
                " ".into(),
                Span::from(format!("{} · {}", att.media_type, format_size(att.size))).dim(),
                "  ".into(),
                Span::from(status).dim().italic(),
            ]);
            line.render_ref(rect, buf);
        }

        if textarea_rect.is_empty() {
            return;
        }
        let prompt = if self.config.disabled {
            "›".dim()
        } else {
            "›".bold()
        };
        buf.set_span(
            textarea_rect.x - LIVE_PREFIX_COLS,
            textarea_rect.y,
            &prompt,
            1,
        );

        self.textarea.render(textarea_rect, buf);
        if self.textarea.is_empty() {
            let placeholder = Span::from(self.config.placeholder.as_str()).dim();
            Line::from(vec![placeholder]).render_ref(textarea_rect, buf);
        }
    }
}

fn format_size(size: u64) -> String {
    if size < 1024 {
        format!("{size} B")
    } else if size < 1024 * 1024 {
        format!("{:.1} kB", size as f64 / 1024.0)
    } else {
        format!("{:.1} MB", size as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;
    use chatline_protocol::transport;

    fn test_composer() -> (ChatComposer, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = unbounded_channel();
        let composer = ChatComposer::new(ComposerConfig::default(), AppEventSender::new(tx));
        (composer, rx)
    }

    fn type_str(composer: &mut ChatComposer, text: &str) {
        for c in text.chars() {
            composer.handle_key_event(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
    }

    fn press_enter(composer: &mut ChatComposer) -> InputResult {
        composer.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
    }

    fn write_temp_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).expect("create file");
        f.write_all(bytes).expect("write file");
        path
    }

    /// Pop the encode-start event the composer posted and feed the finished
    /// encode back, the way the app loop would.
    fn complete_encode(
        composer: &mut ChatComposer,
        rx: &mut UnboundedReceiver<AppEvent>,
        expected_path: &Path,
    ) -> InputResult {
        let event = rx.try_recv().expect("encode-start event");
        let AppEvent::StartAttachmentEncode {
            attachment_id,
            path,
        } = event
        else {
            panic!("unexpected event: {event:?}");
        };
        assert_eq!(path, expected_path);
        let bytes = std::fs::read(&path).expect("read attachment");
        composer.on_attachment_encoded(attachment_id, Ok(transport::encode(&bytes)))
    }

    #[test]
    fn text_only_send_emits_trimmed_submission() {
        let (mut composer, _rx) = test_composer();
        type_str(&mut composer, "  Hello, Claude!  ");

        let result = press_enter(&mut composer);
        assert_eq!(
            result,
            InputResult::Submitted(SubmissionPayload {
                text: "Hello, Claude!".to_string(),
                file: None,
            })
        );
        assert!(composer.is_empty());
    }

    #[test]
    fn empty_send_is_a_silent_noop() {
        let (mut composer, _rx) = test_composer();
        assert_eq!(press_enter(&mut composer), InputResult::None);

        type_str(&mut composer, "   ");
        assert_eq!(press_enter(&mut composer), InputResult::None);
        // Whitespace-only text is preserved, not cleared.
        assert_eq!(composer.textarea.text(), "   ");
    }

    #[test]
    fn shift_enter_inserts_a_newline_instead_of_sending() {
        let (mut composer, _rx) = test_composer();
        type_str(&mut composer, "first");
        composer.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_str(&mut composer, "second");
        assert_eq!(composer.textarea.text(), "first\nsecond");
    }

    #[test]
    fn file_only_send_carries_the_encoded_payload() {
        let (mut composer, mut rx) = test_composer();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp_file(&dir, "test.txt", b"Hello, World!");

        composer.attach_file(path.clone());
        assert_eq!(composer.attachment_name(), Some("test.txt"));
        assert_eq!(
            complete_encode(&mut composer, &mut rx, &path),
            InputResult::None
        );

        let result = press_enter(&mut composer);
        let InputResult::Submitted(payload) = result else {
            panic!("expected submission, got {result:?}");
        };
        assert_eq!(payload.text, "");
        let file = payload.file.expect("file payload");
        assert_eq!(file.name, "test.txt");
        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.size, 13);
        assert_eq!(
            transport::decode(&file.payload).expect("decode payload"),
            b"Hello, World!"
        );
        assert!(composer.is_empty());
    }

    #[test]
    fn send_parked_on_pending_encode_fires_on_completion() {
        let (mut composer, mut rx) = test_composer();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp_file(&dir, "notes.md", b"# notes");

        composer.attach_file(path.clone());
        type_str(&mut composer, "see attached");

        // Encode has not completed: the send is parked, nothing emitted,
        // state intact.
        assert_eq!(press_enter(&mut composer), InputResult::None);
        assert_eq!(composer.textarea.text(), "see attached");
        assert_eq!(composer.attachment_name(), Some("notes.md"));

        // Completion fires the parked send.
        let result = complete_encode(&mut composer, &mut rx, &path);
        let InputResult::Submitted(payload) = result else {
            panic!("expected parked submission, got {result:?}");
        };
        assert_eq!(payload.text, "see attached");
        assert!(payload.file.is_some());
        assert!(composer.is_empty());
    }

    #[test]
    fn stale_encode_cannot_clobber_a_newer_selection() {
        let (mut composer, mut rx) = test_composer();
        let dir = tempfile::tempdir().expect("tempdir");
        let path_a = write_temp_file(&dir, "a.txt", b"aaaa");
        let path_b = write_temp_file(&dir, "b.txt", b"bbbb");

        composer.attach_file(path_a);
        let AppEvent::StartAttachmentEncode {
            attachment_id: id_a,
            ..
        } = rx.try_recv().expect("encode-start for a")
        else {
            panic!("unexpected event");
        };

        composer.attach_file(path_b.clone());

        // A's encode completes after B was selected; it must be discarded.
        let result = composer.on_attachment_encoded(id_a, Ok(transport::encode(b"aaaa")));
        assert_eq!(result, InputResult::None);

        let result = complete_encode(&mut composer, &mut rx, &path_b);
        assert_eq!(result, InputResult::None);

        let InputResult::Submitted(payload) = press_enter(&mut composer) else {
            panic!("expected submission");
        };
        let file = payload.file.expect("file payload");
        assert_eq!(file.name, "b.txt");
        assert_eq!(transport::decode(&file.payload).expect("decode"), b"bbbb");
    }

    #[test]
    fn removed_attachment_does_not_ride_along_on_the_next_send() {
        let (mut composer, mut rx) = test_composer();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp_file(&dir, "photo.png", &[1, 2, 3]);

        composer.attach_file(path.clone());
        complete_encode(&mut composer, &mut rx, &path);
        composer.handle_key_event(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL));
        assert_eq!(composer.attachment_name(), None);

        type_str(&mut composer, "text only");
        assert_eq!(
            press_enter(&mut composer),
            InputResult::Submitted(SubmissionPayload {
                text: "text only".to_string(),
                file: None,
            })
        );
    }

    #[test]
    fn reattaching_the_same_file_after_removal_restarts_the_encode() {
        let (mut composer, mut rx) = test_composer();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp_file(&dir, "again.txt", b"again");

        composer.attach_file(path.clone());
        let first = rx.try_recv().expect("first encode-start");
        composer.remove_attachment();
        composer.attach_file(path);
        let second = rx.try_recv().expect("second encode-start");

        let (
            AppEvent::StartAttachmentEncode {
                attachment_id: first_id,
                ..
            },
            AppEvent::StartAttachmentEncode {
                attachment_id: second_id,
                ..
            },
        ) = (first, second)
        else {
            panic!("unexpected events");
        };
        assert_ne!(first_id, second_id);
        assert_eq!(composer.attachment_name(), Some("again.txt"));
    }

    #[test]
    fn encode_failure_rejects_the_parked_send_and_keeps_the_text() {
        let (mut composer, mut rx) = test_composer();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp_file(&dir, "gone.txt", b"gone");

        composer.attach_file(path);
        let AppEvent::StartAttachmentEncode { attachment_id, .. } =
            rx.try_recv().expect("encode-start")
        else {
            panic!("unexpected event");
        };

        type_str(&mut composer, "important text");
        assert_eq!(press_enter(&mut composer), InputResult::None);

        let result = composer.on_attachment_encoded(attachment_id, Err("read failed".to_string()));
        assert_eq!(result, InputResult::None);
        assert_eq!(composer.attachment_name(), None);
        assert_eq!(composer.textarea.text(), "important text");

        let notice = rx.try_recv().expect("failure notice");
        let AppEvent::AttachmentFailed { name, message } = notice else {
            panic!("unexpected event: {notice:?}");
        };
        assert_eq!(name, "gone.txt");
        assert_eq!(message, "read failed");
    }

    #[test]
    fn disabled_composer_emits_nothing_and_keeps_its_text() {
        let (mut composer, mut rx) = test_composer();
        type_str(&mut composer, "draft");

        composer.set_config(ComposerConfig {
            disabled: true,
            ..ComposerConfig::default()
        });

        // Typing, pasting, attaching, and sending are all inert.
        type_str(&mut composer, "more");
        assert!(!composer.handle_paste("pasted".to_string()));
        composer.attach_file(PathBuf::from("/tmp/whatever.txt"));
        assert_eq!(press_enter(&mut composer), InputResult::None);

        assert_eq!(composer.textarea.text(), "draft");
        assert_eq!(composer.attachment_name(), None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn paste_of_plain_text_is_inserted() {
        let (mut composer, _rx) = test_composer();
        assert!(composer.handle_paste("hello world".to_string()));
        assert_eq!(composer.textarea.text(), "hello world");
    }

    #[test]
    fn paste_of_a_file_path_attaches_instead_of_inserting() {
        let (mut composer, mut rx) = test_composer();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_temp_file(&dir, "drop.pdf", b"%PDF-");

        composer.handle_paste(path.to_string_lossy().into_owned());
        assert_eq!(composer.attachment_name(), Some("drop.pdf"));
        assert_eq!(composer.textarea.text(), "");
        assert!(matches!(
            rx.try_recv(),
            Ok(AppEvent::StartAttachmentEncode { .. })
        ));
    }

    #[test]
    fn format_size_picks_a_readable_unit() {
        assert_eq!(format_size(13), "13 B");
        assert_eq!(format_size(2048), "2.0 kB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
