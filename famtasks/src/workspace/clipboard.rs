//! Clipboard seam used to share the invite link.

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;

/// Errors that can occur while copying text.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// No clipboard is reachable from here.
    #[error("clipboard unavailable")]
    Unavailable,

    /// Writing to the clipboard failed.
    #[error("clipboard write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Something text can be copied to.
pub trait Clipboard: Send + Sync {
    /// Places `text` on the clipboard.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError`] if the text could not be copied.
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Copies through the terminal with an OSC 52 escape sequence.
///
/// Most modern terminal emulators forward the payload to the system
/// clipboard, including over SSH.
pub struct Osc52Clipboard<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> Osc52Clipboard<W> {
    /// Clipboard writing escape sequences to `out`.
    pub const fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the inner writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> Clipboard for Osc52Clipboard<W> {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut out = self.out.lock();
        write!(out, "\x1b]52;c;{}\x07", STANDARD.encode(text))?;
        out.flush()?;
        Ok(())
    }
}
