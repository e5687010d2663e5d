//! TUI rendering and terminal management (impure shell)

pub mod constants;
pub mod input;
pub mod layout;
pub mod styles;
pub mod tabs;
pub mod text_window;

pub use input::TerminalKeys;
pub use layout::{render_screen, ScreenLayout};
pub use styles::{ChatStyles, ColorConfig};
pub use text_window::TextWindow;

use crate::state::core::Core;
use crate::state::event_loop::{Display, EventLoop};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::Backend, backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during TUI operations
#[derive(Debug, Error)]
pub enum TuiError {
    /// IO error during terminal operations
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),
}

/// Draws a [`Core`] on a ratatui terminal.
///
/// Generic over backend to support testing with TestBackend
pub struct TerminalDisplay<B>
where
    B: Backend,
{
    terminal: Terminal<B>,
    styles: ChatStyles,
}

impl<B: Backend> TerminalDisplay<B> {
    /// Draw to `terminal` with `styles`.
    pub fn new(terminal: Terminal<B>, styles: ChatStyles) -> Self {
        Self { terminal, styles }
    }

    /// The wrapped terminal.
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

impl<B: Backend> Display for TerminalDisplay<B> {
    fn draw(&mut self, core: &mut Core) -> io::Result<()> {
        if core.take_full_redraw() {
            self.terminal.clear()?;
        }
        let styles = &self.styles;
        let core = &*core;
        self.terminal
            .draw(|frame| render_screen(frame, core, styles))?;
        Ok(())
    }

    fn size(&self) -> io::Result<(u16, u16)> {
        let size = self.terminal.size()?;
        Ok((size.width, size.height))
    }
}

/// Run the client on the real terminal until the core stops.
///
/// Sets up raw mode with alternate screen and bracketed paste, and always
/// restores the terminal, even when the loop fails.
pub fn run(core: &mut Core, colors: ColorConfig) -> Result<(), TuiError> {
    let result = setup_terminal().and_then(|terminal| {
        let display = TerminalDisplay::new(terminal, ChatStyles::with_color_config(colors));
        let mut event_loop = EventLoop::new(TerminalKeys, display);
        event_loop.run(core)?;
        Ok(())
    });

    // Always restore terminal state
    restore_terminal()?;
    debug!("Terminal restored");

    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableBracketedPaste)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

/// Restore terminal to normal state
///
/// Disables raw mode and bracketed paste, and leaves alternate screen
fn restore_terminal() -> Result<(), TuiError> {
    disable_raw_mode()?;
    io::stdout().execute(DisableBracketedPaste)?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolvedConfig;
    use crate::session::{event_channel, InboundMessage, LoopbackSession, SessionEvent};
    use ratatui::backend::TestBackend;

    fn core() -> Core {
        let (tx, rx) = event_channel();
        let config = ResolvedConfig {
            own_nick: "alice".to_string(),
            ..ResolvedConfig::default()
        };
        Core::new(config, Box::new(LoopbackSession::new(tx, "alice")), rx)
    }

    fn display(width: u16, height: u16) -> TerminalDisplay<TestBackend> {
        let terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        TerminalDisplay::new(terminal, ChatStyles::default())
    }

    fn row(display: &TerminalDisplay<TestBackend>, y: u16) -> String {
        let buffer = display.terminal().backend().buffer();
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect()
    }

    #[test]
    fn tui_error_from_io_error() {
        let io_err = io::Error::other("test error");
        let tui_err: TuiError = io_err.into();
        assert!(matches!(tui_err, TuiError::Io(_)));
    }

    #[test]
    fn size_reports_backend_dimensions() {
        assert_eq!(display(90, 30).size().unwrap(), (90, 30));
    }

    #[test]
    fn draws_tab_bar_above_input() {
        let mut core = core();
        let mut display = display(60, 12);
        core.resize(60, 12);
        core.handle_session_event(SessionEvent::Message(
            InboundMessage::new("room", "hello").from_nick("bob"),
        ));
        display.draw(&mut core).unwrap();

        assert!(row(&display, 10).starts_with("[0|1] Roster"));
    }

    #[test]
    fn conversation_text_is_drawn() {
        let mut core = core();
        let mut display = display(60, 12);
        core.resize(60, 12);
        core.handle_session_event(SessionEvent::Message(
            InboundMessage::new("room", "hello there").from_nick("bob"),
        ));
        core.feed_keys(&["^N"]);
        display.draw(&mut core).unwrap();

        let screen: String = (0..12).map(|y| row(&display, y)).collect();
        assert!(screen.contains("hello there"));
        assert!(row(&display, 10).contains("room"));
    }

    #[test]
    fn input_line_is_drawn_with_cursor() {
        let mut core = core();
        let mut display = display(40, 10);
        core.resize(40, 10);
        core.feed_keys(&["/", "h", "e"]);
        display.draw(&mut core).unwrap();
        assert!(row(&display, 9).starts_with("/he"));
    }

    #[test]
    fn paused_prompt_replaces_input() {
        let mut core = core();
        let mut display = display(40, 10);
        core.resize(40, 10);
        let _answer = core.pause_for_input("Password: ");
        core.feed_keys(&["x"]);
        display.draw(&mut core).unwrap();
        assert!(row(&display, 9).starts_with("Password: x"));
    }

    #[test]
    fn full_redraw_request_is_consumed() {
        let mut core = core();
        let mut display = display(40, 10);
        core.resize(40, 10);
        core.request_full_redraw();
        display.draw(&mut core).unwrap();
        assert!(!core.take_full_redraw());
    }
}
