//! Raw terminal input: single-byte polling and the focus-report
//! escape sequence state machine
//!
//! Focus reporting (`CSI ? 1004 h`) makes the terminal emit `ESC [ I`
//! on focus-in and `ESC [ O` on focus-out. The parser recognizes
//! those three-byte sequences amid ordinary keystrokes, one byte per
//! input poll, without blocking.

use std::io;
use std::time::{Duration, Instant};

/// A stale partial sequence is dropped after this long so a pending
/// ESC cannot swallow later keystrokes indefinitely.
const SEQUENCE_TIMEOUT: Duration = Duration::from_millis(500);

const ESC: u8 = 0x1b;

/// What one fed byte amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Byte consumed (or discarded) by the sequence
    None,
    /// Plain keystroke for command dispatch
    Key(u8),
    /// Recognized focus transition: true = gained, false = lost
    Focus(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    SawEsc,
    SawEscBracket,
}

/// Three-state recognizer for `ESC [ I` / `ESC [ O`.
///
/// Bytes consumed by an aborted sequence are dropped, not replayed —
/// a second ESC mid-sequence does not restart recognition. The
/// terminal protocol only emits single-byte payloads after `ESC [`,
/// so nothing of value is lost.
#[derive(Debug)]
pub struct FocusParser {
    state: State,
    started: Option<Instant>,
}

impl Default for FocusParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusParser {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            started: None,
        }
    }

    /// Drop a stale partial sequence. Called on every poll timeout and
    /// before each fed byte.
    pub fn expire(&mut self, now: Instant) {
        if self.state != State::Idle {
            if let Some(started) = self.started {
                if now.duration_since(started) > SEQUENCE_TIMEOUT {
                    self.reset();
                }
            }
        }
    }

    fn reset(&mut self) {
        self.state = State::Idle;
        self.started = None;
    }

    /// Run one transition for one input byte.
    pub fn feed(&mut self, byte: u8, now: Instant) -> Step {
        self.expire(now);
        match self.state {
            State::Idle => {
                if byte == ESC {
                    self.state = State::SawEsc;
                    self.started = Some(now);
                    Step::None
                } else {
                    Step::Key(byte)
                }
            }
            State::SawEsc => {
                if byte == b'[' {
                    self.state = State::SawEscBracket;
                    Step::None
                } else {
                    self.reset();
                    Step::None
                }
            }
            State::SawEscBracket => {
                self.reset();
                match byte {
                    b'I' => Step::Focus(true),
                    b'O' => Step::Focus(false),
                    _ => Step::None,
                }
            }
        }
    }
}

/// Wait up to `timeout` for one byte on stdin.
///
/// The sole suspension point of the dashboard loop. Returns Ok(None)
/// when the timeout elapses with no input.
#[cfg(unix)]
pub fn poll_byte(timeout: Duration) -> io::Result<Option<u8>> {
    use std::os::unix::io::AsRawFd;

    let fd = io::stdin().as_raw_fd();
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as libc::c_int;
    let ready = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    if ready < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(None);
        }
        return Err(err);
    }
    if ready == 0 {
        return Ok(None);
    }

    let mut buf = [0u8; 1];
    let n = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, 1) };
    match n {
        1 => Ok(Some(buf[0])),
        0 => Ok(None),
        _ => {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                Ok(None)
            } else {
                Err(err)
            }
        }
    }
}

#[cfg(not(unix))]
pub fn poll_byte(timeout: Duration) -> io::Result<Option<u8>> {
    std::thread::sleep(timeout);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(parser: &mut FocusParser, bytes: &[u8], now: Instant) -> Vec<Step> {
        bytes.iter().map(|&b| parser.feed(b, now)).collect()
    }

    #[test]
    fn focus_in_sequence() {
        let mut parser = FocusParser::new();
        let now = Instant::now();
        let steps = feed_all(&mut parser, &[0x1b, b'[', b'I'], now);
        assert_eq!(steps, vec![Step::None, Step::None, Step::Focus(true)]);
        assert_eq!(parser.state, State::Idle);
    }

    #[test]
    fn focus_out_sequence() {
        let mut parser = FocusParser::new();
        let now = Instant::now();
        let steps = feed_all(&mut parser, &[0x1b, b'[', b'O'], now);
        assert_eq!(steps.last(), Some(&Step::Focus(false)));
    }

    #[test]
    fn unrecognized_third_byte_is_discarded() {
        let mut parser = FocusParser::new();
        let now = Instant::now();
        let steps = feed_all(&mut parser, &[0x1b, b'[', b'X'], now);
        assert_eq!(steps, vec![Step::None, Step::None, Step::None]);
        assert_eq!(parser.state, State::Idle);
    }

    #[test]
    fn plain_bytes_pass_through_as_keys() {
        let mut parser = FocusParser::new();
        let now = Instant::now();
        assert_eq!(parser.feed(b'q', now), Step::Key(b'q'));
        assert_eq!(parser.feed(b'r', now), Step::Key(b'r'));
        assert_eq!(parser.state, State::Idle);
    }

    #[test]
    fn non_bracket_after_esc_aborts_without_replay() {
        let mut parser = FocusParser::new();
        let now = Instant::now();
        assert_eq!(parser.feed(0x1b, now), Step::None);
        // 'q' is swallowed with the aborted sequence, not dispatched
        assert_eq!(parser.feed(b'q', now), Step::None);
        assert_eq!(parser.state, State::Idle);
        assert_eq!(parser.feed(b'q', now), Step::Key(b'q'));
    }

    #[test]
    fn esc_mid_sequence_is_dropped_not_restarted() {
        let mut parser = FocusParser::new();
        let now = Instant::now();
        parser.feed(0x1b, now);
        assert_eq!(parser.feed(0x1b, now), Step::None);
        assert_eq!(parser.state, State::Idle);
        // The second ESC did not begin a new sequence
        let steps = feed_all(&mut parser, &[b'[', b'I'], now);
        assert_eq!(steps, vec![Step::Key(b'['), Step::Key(b'I')]);
    }

    #[test]
    fn stale_prefix_expires_after_timeout() {
        let mut parser = FocusParser::new();
        let start = Instant::now();
        parser.feed(0x1b, start);
        let later = start + Duration::from_millis(600);
        // The remaining sequence bytes arrive too late and fall
        // through as ordinary keystrokes
        assert_eq!(parser.feed(b'[', later), Step::Key(b'['));
        assert_eq!(parser.feed(b'I', later), Step::Key(b'I'));
    }

    #[test]
    fn expire_on_poll_timeout_resets_state() {
        let mut parser = FocusParser::new();
        let start = Instant::now();
        parser.feed(0x1b, start);
        assert_eq!(parser.state, State::SawEsc);
        parser.expire(start + Duration::from_millis(501));
        assert_eq!(parser.state, State::Idle);
    }

    #[test]
    fn fast_sequence_is_not_expired() {
        let mut parser = FocusParser::new();
        let start = Instant::now();
        parser.feed(0x1b, start);
        let step = parser.feed(b'[', start + Duration::from_millis(400));
        assert_eq!(step, Step::None);
        assert_eq!(
            parser.feed(b'I', start + Duration::from_millis(450)),
            Step::Focus(true)
        );
    }
}
