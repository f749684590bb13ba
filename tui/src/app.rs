//! The UI event loop: one task, cooperative, serializing all input.
//!
//! Terminal input, internal app events, and host events are merged with
//! `tokio::select!`, so composer state is only ever touched from this loop.
//! The only suspension point a submission can hit is the attachment encode,
//! which runs on a blocking task and reports back through the app event
//! channel.

use anyhow::Result;
use crossterm::event::Event as TermEvent;
use crossterm::event::EventStream;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use ratatui::layout::Rect;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Text;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Widget;
use ratatui::widgets::Wrap;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::StreamExt;

use chatline_protocol::Event;
use chatline_protocol::Op;
use chatline_protocol::SubmissionPayload;
use chatline_protocol::transport;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::bottom_pane::BottomPane;
use crate::bottom_pane::BottomPaneParams;
use crate::bottom_pane::ComposerConfig;
use crate::bottom_pane::InputResult;
use crate::history_cell::AssistantHistoryCell;
use crate::history_cell::ErrorHistoryCell;
use crate::history_cell::HistoryCell;
use crate::history_cell::UserHistoryCell;
use crate::terminal_palette::TerminalProbe;
use crate::theme::Theme;
use crate::theme::ThemeMode;
use crate::theme::detect_mode;
use crate::tui;

/// Host-supplied configuration for one chat session's UI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub composer: ComposerConfig,
    /// Opaque model identifier shown in the session header.
    pub model_label: String,
}

/// Run the chat UI until the user quits or the host goes away.
///
/// `op_tx` carries submissions (and lifecycle ops) to the host; `event_rx`
/// brings assistant replies and errors back.
pub async fn run_chat_app(
    config: AppConfig,
    op_tx: UnboundedSender<Op>,
    event_rx: UnboundedReceiver<Event>,
) -> Result<()> {
    // Probe the ambient theme before raw mode so the background query's
    // reply cannot be swallowed by the input event stream.
    let probe = TerminalProbe;
    let initial_mode = detect_mode(&probe);

    let mut terminal = tui::init()?;
    let result = App::new(config, op_tx, initial_mode)
        .run(&mut terminal, event_rx)
        .await;
    tui::restore()?;
    result
}

struct App {
    bottom_pane: BottomPane,
    transcript: Vec<Box<dyn HistoryCell>>,
    theme: Theme,
    probe: TerminalProbe,
    model_label: String,
    op_tx: UnboundedSender<Op>,
    app_event_tx: AppEventSender,
    app_event_rx: Option<UnboundedReceiver<AppEvent>>,
}

impl App {
    fn new(config: AppConfig, op_tx: UnboundedSender<Op>, initial_mode: ThemeMode) -> Self {
        let (tx, rx) = unbounded_channel();
        let app_event_tx = AppEventSender::new(tx);
        let bottom_pane = BottomPane::new(BottomPaneParams {
            app_event_tx: app_event_tx.clone(),
            config: config.composer,
        });
        Self {
            bottom_pane,
            transcript: Vec::new(),
            theme: Theme::for_mode(initial_mode),
            probe: TerminalProbe,
            model_label: config.model_label,
            op_tx,
            app_event_tx,
            app_event_rx: Some(rx),
        }
    }

    async fn run(
        mut self,
        terminal: &mut tui::Tui,
        mut event_rx: UnboundedReceiver<Event>,
    ) -> Result<()> {
        let mut app_event_rx = self
            .app_event_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("app event receiver already taken"))?;
        let mut term_events = EventStream::new();

        self.draw(terminal)?;
        loop {
            let exit = tokio::select! {
                maybe_event = term_events.next() => match maybe_event {
                    Some(Ok(event)) => self.handle_terminal_event(event),
                    Some(Err(err)) => return Err(err.into()),
                    None => true,
                },
                Some(app_event) = app_event_rx.recv() => self.handle_app_event(app_event),
                maybe_host = event_rx.recv() => match maybe_host {
                    Some(event) => {
                        self.handle_host_event(event);
                        false
                    }
                    // The host side is gone; there is nothing left to talk to.
                    None => true,
                },
            };
            if exit {
                break;
            }
            self.draw(terminal)?;
        }

        let _ = self.op_tx.send(Op::Shutdown);
        Ok(())
    }

    fn handle_terminal_event(&mut self, event: TermEvent) -> bool {
        match event {
            TermEvent::Key(key) => self.handle_key_event(key),
            TermEvent::Paste(pasted) => {
                self.bottom_pane.composer_mut().handle_paste(pasted);
                false
            }
            // Terminals emit no color-scheme-changed notification; focus and
            // resize are the closest ambient-change signals available.
            TermEvent::FocusGained | TermEvent::Resize(_, _) => {
                self.refresh_theme();
                false
            }
            _ => false,
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        if key.kind == KeyEventKind::Press && key.modifiers == KeyModifiers::CONTROL {
            match key.code {
                KeyCode::Char('c') => return true,
                KeyCode::Char('l') => {
                    self.clear_chat();
                    return false;
                }
                _ => {}
            }
        }

        match self.bottom_pane.composer_mut().handle_key_event(key) {
            InputResult::Submitted(payload) => self.dispatch_submission(payload),
            InputResult::None => {}
        }
        false
    }

    fn handle_app_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::StartAttachmentEncode {
                attachment_id,
                path,
            } => {
                let tx = self.app_event_tx.clone();
                tokio::task::spawn_blocking(move || {
                    let result = std::fs::read(&path)
                        .map(|bytes| transport::encode(&bytes))
                        .map_err(|err| err.to_string());
                    tx.send(AppEvent::AttachmentEncoded {
                        attachment_id,
                        result,
                    });
                });
                false
            }
            AppEvent::AttachmentEncoded {
                attachment_id,
                result,
            } => {
                match self
                    .bottom_pane
                    .composer_mut()
                    .on_attachment_encoded(attachment_id, result)
                {
                    InputResult::Submitted(payload) => self.dispatch_submission(payload),
                    InputResult::None => {}
                }
                false
            }
            AppEvent::AttachmentFailed { name, message } => {
                self.transcript.push(Box::new(ErrorHistoryCell::new(format!(
                    "Attachment `{name}` was dropped: {message}"
                ))));
                false
            }
            AppEvent::ExitRequest => true,
        }
    }

    fn handle_host_event(&mut self, event: Event) {
        match event {
            Event::TurnStarted => self.bottom_pane.set_task_running(true),
            Event::AssistantMessage { text } => {
                self.transcript.push(Box::new(AssistantHistoryCell::new(text)));
                self.bottom_pane.set_task_running(false);
            }
            Event::TurnError { message } => {
                self.transcript.push(Box::new(ErrorHistoryCell::new(message)));
                self.bottom_pane.set_task_running(false);
            }
            _ => {}
        }
    }

    /// Forward a validated submission to the host and record it in the
    /// transcript. Submissions leave in the order they were validated; the
    /// channel preserves it.
    fn dispatch_submission(&mut self, payload: SubmissionPayload) {
        self.transcript
            .push(Box::new(UserHistoryCell::from_payload(&payload)));
        if self.op_tx.send(Op::SubmitMessage { payload }).is_err() {
            tracing::error!("host channel closed; submission dropped");
            self.transcript.push(Box::new(ErrorHistoryCell::new(
                "The chat backend is gone; the message was not delivered.".to_string(),
            )));
            return;
        }
        self.bottom_pane.set_task_running(true);
    }

    fn clear_chat(&mut self) {
        self.transcript.clear();
        let _ = self.op_tx.send(Op::ClearHistory);
    }

    fn refresh_theme(&mut self) {
        let mode = detect_mode(&self.probe);
        self.apply_theme(mode);
    }

    /// Restyling is idempotent: re-applying the current mode is a no-op.
    fn apply_theme(&mut self, mode: ThemeMode) -> bool {
        if self.theme.mode == mode {
            return false;
        }
        self.theme = Theme::for_mode(mode);
        true
    }

    fn draw(&mut self, terminal: &mut tui::Tui) -> Result<()> {
        terminal.draw(|frame| {
            let area = frame.area();
            let pane_height = self.bottom_pane.desired_height(area.width).min(area.height);
            let pane_area = Rect::new(
                area.x,
                area.bottom().saturating_sub(pane_height),
                area.width,
                pane_height,
            );
            let transcript_area = Rect::new(
                area.x,
                area.y,
                area.width,
                area.height.saturating_sub(pane_height),
            );
            let cursor = self.bottom_pane.cursor_pos(pane_area);

            let buf = frame.buffer_mut();
            if !transcript_area.is_empty() {
                let mut lines: Vec<Line<'static>> = vec![
                    Line::from(format!("chatline · {}", self.model_label)).dim(),
                    Line::from(""),
                ];
                for cell in &self.transcript {
                    lines.extend(cell.display_lines());
                }

                let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
                let total = paragraph.line_count(transcript_area.width);
                let overflow = total.saturating_sub(usize::from(transcript_area.height));
                let scroll = u16::try_from(overflow).unwrap_or(u16::MAX);
                paragraph.scroll((scroll, 0)).render(transcript_area, buf);
            }
            self.bottom_pane.render(pane_area, buf, &self.theme);

            if let Some((x, y)) = cursor {
                frame.set_cursor_position((x, y));
            }
        })?;
        Ok(())
    }
}
