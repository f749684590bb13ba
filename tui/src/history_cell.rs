//! Transcript cells for the chat view.
//!
//! Each cell knows how to express itself as owned [`Line`]s; the app
//! flattens all cells into one paragraph and keeps it scrolled to the
//! bottom.

use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;

use chatline_protocol::SubmissionPayload;

/// An entry in the conversation transcript.
pub(crate) trait HistoryCell: std::fmt::Debug {
    fn display_lines(&self) -> Vec<Line<'static>>;
}

/// What the user sent: optional attachment caption plus the message text.
#[derive(Debug)]
pub(crate) struct UserHistoryCell {
    message: String,
    attachment_caption: Option<String>,
}

impl UserHistoryCell {
    pub(crate) fn from_payload(payload: &SubmissionPayload) -> Self {
        Self {
            message: payload.text.clone(),
            attachment_caption: payload.file.as_ref().map(|file| {
                if chatline_protocol::is_image_media_type(&file.mime_type) {
                    format!("[Image: {}]", file.name)
                } else {
                    format!("[Document: {}]", file.name)
                }
            }),
        }
    }
}

impl HistoryCell for UserHistoryCell {
    fn display_lines(&self) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = Vec::new();
        if let Some(caption) = &self.attachment_caption {
            lines.push(Line::from(vec![
                Span::from("› ").bold(),
                Span::from(caption.clone()).dim().italic(),
            ]));
        }
        for (idx, text_line) in self.message.lines().enumerate() {
            let prefix = if idx == 0 && self.attachment_caption.is_none() {
                Span::from("› ").bold()
            } else {
                Span::from("  ")
            };
            lines.push(Line::from(vec![prefix, Span::from(text_line.to_string())]));
        }
        lines.push(Line::from(""));
        lines
    }
}

#[derive(Debug)]
pub(crate) struct AssistantHistoryCell {
    message: String,
}

impl AssistantHistoryCell {
    pub(crate) fn new(message: String) -> Self {
        Self { message }
    }
}

impl HistoryCell for AssistantHistoryCell {
    fn display_lines(&self) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = self
            .message
            .lines()
            .map(|text_line| Line::from(text_line.to_string()))
            .collect();
        lines.push(Line::from(""));
        lines
    }
}

/// A submission-scoped failure: decode errors, endpoint errors, dropped
/// attachments.
#[derive(Debug)]
pub(crate) struct ErrorHistoryCell {
    message: String,
}

impl ErrorHistoryCell {
    pub(crate) fn new(message: String) -> Self {
        Self { message }
    }
}

impl HistoryCell for ErrorHistoryCell {
    fn display_lines(&self) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = self
            .message
            .lines()
            .map(|text_line| Line::from(Span::from(text_line.to_string()).red()))
            .collect();
        lines.push(Line::from(""));
        lines
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use chatline_protocol::AttachedFilePayload;

    fn rendered(lines: &[Line<'static>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn user_cell_shows_attachment_caption_before_the_text() {
        let cell = UserHistoryCell::from_payload(&SubmissionPayload {
            text: "what is in this file?".to_string(),
            file: Some(AttachedFilePayload {
                name: "scan.png".to_string(),
                mime_type: "image/png".to_string(),
                size: 3,
                payload: "AAEC".to_string(),
            }),
        });

        assert_eq!(
            rendered(&cell.display_lines()),
            vec![
                "› [Image: scan.png]".to_string(),
                "  what is in this file?".to_string(),
                String::new(),
            ]
        );
    }

    #[test]
    fn user_cell_labels_documents() {
        let cell = UserHistoryCell::from_payload(&SubmissionPayload {
            text: String::new(),
            file: Some(AttachedFilePayload {
                name: "report.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                size: 10,
                payload: String::new(),
            }),
        });

        assert_eq!(
            rendered(&cell.display_lines()),
            vec!["› [Document: report.pdf]".to_string(), String::new()]
        );
    }

    #[test]
    fn assistant_cell_preserves_line_breaks() {
        let cell = AssistantHistoryCell::new("first\nsecond".to_string());
        assert_eq!(
            rendered(&cell.display_lines()),
            vec!["first".to_string(), "second".to_string(), String::new()]
        );
    }
}
