// Forbid accidental stdout/stderr writes in the library portion of the TUI.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod app;
mod app_event;
mod app_event_sender;
mod attachment_paste;
mod bottom_pane;
mod history_cell;
mod terminal_palette;
mod theme;
mod tui;

pub use app::AppConfig;
pub use app::run_chat_app;
pub use bottom_pane::ComposerConfig;
pub use terminal_palette::TerminalProbe;
pub use theme::AmbientColorProbe;
pub use theme::Rgb;
pub use theme::ThemeMode;
pub use theme::detect_mode;
