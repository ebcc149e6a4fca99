//! Application entry point

use std::io::{self, Write};

use crossterm::event::{DisableFocusChange, EnableFocusChange};
use crossterm::{cursor, terminal};

mod bar;
mod fetch;
mod glide;
mod input;
mod sched;
mod theme;
mod ui;
mod usage;

/// Restore terminal to normal mode. Safe to call more than once.
fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = crossterm::execute!(
        stdout,
        DisableFocusChange,
        terminal::LeaveAlternateScreen,
        cursor::Show
    );
    let _ = terminal::disable_raw_mode();
    let _ = stdout.flush();
}

/// Flush OS-level terminal input buffer.
#[cfg(unix)]
fn flush_stdin_buffer() {
    use std::os::unix::io::AsRawFd;
    unsafe {
        libc::tcflush(io::stdin().as_raw_fd(), libc::TCIFLUSH);
    }
}

#[cfg(not(unix))]
fn flush_stdin_buffer() {}

/// Scoped terminal acquisition. Raw mode, the alternate screen, and
/// focus-change reporting are all released in Drop, so the disabling
/// escapes go out on every exit path, expected or not.
struct TerminalSession;

impl TerminalSession {
    fn acquire() -> io::Result<Self> {
        let session = Self;
        crossterm::execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableFocusChange
        )?;
        terminal::enable_raw_mode()?;
        Ok(session)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        cleanup_terminal();
        flush_stdin_buffer();
    }
}

/// Install panic hook to restore terminal before printing error.
fn setup_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        cleanup_terminal();
        eprintln!("Application panicked!");
        if let Some(location) = panic_info.location() {
            eprintln!("Location: {}", location);
        }
        if let Some(payload) = panic_info.payload().downcast_ref::<&str>() {
            eprintln!("Message: {}", payload);
        } else if let Some(payload) = panic_info.payload().downcast_ref::<String>() {
            eprintln!("Message: {}", payload);
        }
        original_hook(panic_info);
    }));
}

fn main() -> io::Result<()> {
    // Logging stays quiet unless explicitly requested; redirect stderr
    // to a file when debugging under the TUI.
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::init();
    }
    setup_panic_hook();

    let _session = TerminalSession::acquire()?;

    let backend = ratatui::backend::CrosstermBackend::new(io::stdout());
    let mut terminal = ratatui::Terminal::new(backend)?;

    ui::App::new().run(&mut terminal)
}
