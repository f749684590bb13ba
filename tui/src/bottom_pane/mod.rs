//! Pane displayed in the lower part of the viewport: the chat composer plus
//! a status line while a turn is running and a one-line key-hint footer.

mod chat_composer;
mod textarea;

pub(crate) use chat_composer::ChatComposer;
pub use chat_composer::ComposerConfig;
pub(crate) use chat_composer::InputResult;

use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::WidgetRef;

use crate::app_event_sender::AppEventSender;
use crate::theme::Theme;

pub(crate) struct BottomPaneParams {
    pub(crate) app_event_tx: AppEventSender,
    pub(crate) config: ComposerConfig,
}

pub(crate) struct BottomPane {
    composer: ChatComposer,
    is_task_running: bool,
}

impl BottomPane {
    pub(crate) fn new(params: BottomPaneParams) -> Self {
        Self {
            composer: ChatComposer::new(params.config, params.app_event_tx),
            is_task_running: false,
        }
    }

    pub(crate) fn composer_mut(&mut self) -> &mut ChatComposer {
        &mut self.composer
    }

    pub(crate) fn set_task_running(&mut self, running: bool) {
        self.is_task_running = running;
    }

    pub(crate) fn desired_height(&self, width: u16) -> u16 {
        let status_height = u16::from(self.is_task_running);
        // One spacer line above the composer, one hint line below it.
        status_height + 1 + self.composer.desired_height(width) + 1
    }

    fn layout_areas(&self, area: Rect) -> [Rect; 4] {
        let status_height = u16::from(self.is_task_running);
        let composer_height = self.composer.desired_height(area.width);
        let [status, spacer, composer, footer] = Layout::vertical([
            Constraint::Length(status_height),
            Constraint::Length(1),
            Constraint::Length(composer_height),
            Constraint::Length(1),
        ])
        .areas(area);
        [status, spacer, composer, footer]
    }

    pub(crate) fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let [_, _, composer_rect, _] = self.layout_areas(area);
        self.composer.cursor_pos(composer_rect)
    }

    pub(crate) fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        if area.is_empty() {
            return;
        }
        let [status_rect, _, composer_rect, footer_rect] = self.layout_areas(area);

        if !status_rect.is_empty() {
            Line::from(vec![" ".into(), Span::from("Thinking...").dim().italic()])
                .render_ref(status_rect, buf);
        }

        self.composer.render(composer_rect, buf, theme);

        if !footer_rect.is_empty() {
            render_footer(footer_rect, buf, self.composer.config().disabled);
        }
    }
}

fn render_footer(area: Rect, buf: &mut Buffer, disabled: bool) {
    let items: &[(&str, &str)] = if disabled {
        &[("ctrl+c", "quit")]
    } else {
        &[
            ("enter", "send"),
            ("shift+enter", "newline"),
            ("ctrl+x", "remove file"),
            ("ctrl+l", "clear chat"),
            ("ctrl+c", "quit"),
        ]
    };

    let mut spans: Vec<Span> = Vec::with_capacity(items.len() * 3);
    spans.push(" ".into());
    for (idx, (key, label)) in items.iter().enumerate() {
        spans.push(Span::from(*key).bold());
        spans.push(Span::from(format!(" {label}")).dim());
        if idx + 1 != items.len() {
            spans.push("   ".into());
        }
    }
    Line::from(spans).render_ref(area, buf);
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;

    fn test_pane() -> BottomPane {
        let (tx, _rx) = unbounded_channel();
        BottomPane::new(BottomPaneParams {
            app_event_tx: AppEventSender::new(tx),
            config: ComposerConfig::default(),
        })
    }

    #[test]
    fn status_line_appears_while_a_task_is_running() {
        let mut pane = test_pane();
        let idle = pane.desired_height(80);
        pane.set_task_running(true);
        assert_eq!(pane.desired_height(80), idle + 1);
    }

    #[test]
    fn footer_renders_key_hints() {
        let pane = test_pane();
        let area = Rect::new(0, 0, 80, pane.desired_height(80));
        let mut buf = Buffer::empty(area);
        pane.render(area, &mut buf, &Theme::default());

        let footer_y = area.height - 1;
        let row: String = (0..area.width)
            .map(|x| buf[(x, footer_y)].symbol().to_string())
            .collect();
        assert!(row.contains("enter send"));
        assert!(row.contains("ctrl+x remove file"));
    }
}
