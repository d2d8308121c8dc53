//! Print capture
//!
//! While an [`OutputCapture`] is alive, everything the script prints lands in
//! an in-memory buffer instead of the console's normal sink. The previous sink
//! is restored when the capture finishes or is dropped, on every exit path.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use crate::interpreter::stdlib::methods::is_space;
use crate::interpreter::Console;

/// Shared in-memory byte buffer
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Rc<RefCell<Vec<u8>>>);

impl LogBuffer {
    /// Captured text as log lines
    ///
    /// Surrounding whitespace (as `str.strip` sees it) is trimmed, then the
    /// text is split on `\n`.
    /// Blank lines inside the text survive; no output at all yields no lines.
    pub fn finalize(&self) -> Vec<String> {
        let bytes = self.0.borrow();
        let text = String::from_utf8_lossy(&bytes);
        let trimmed = text.trim_matches(is_space);
        if trimmed.is_empty() {
            return Vec::new();
        }
        trimmed.split('\n').map(str::to_string).collect()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Scoped redirection of a console into a [`LogBuffer`]
pub struct OutputCapture {
    console: Rc<Console>,
    buffer: LogBuffer,
    previous: Option<Box<dyn Write>>,
}

impl OutputCapture {
    pub fn begin(console: &Rc<Console>) -> Self {
        let buffer = LogBuffer::default();
        let previous = console.swap(Box::new(buffer.clone()));
        OutputCapture {
            console: Rc::clone(console),
            buffer,
            previous: Some(previous),
        }
    }

    /// Restore the console and return the captured log lines
    pub fn finish(mut self) -> Vec<String> {
        self.restore();
        self.buffer.finalize()
    }

    fn restore(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.console.swap(previous);
        }
    }
}

impl Drop for OutputCapture {
    fn drop(&mut self) {
        self.restore();
    }
}
