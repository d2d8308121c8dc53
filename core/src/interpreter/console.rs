//! Destination of `print`
//!
//! The interpreter never writes to the process stdout directly; it writes to
//! a [`Console`] whose sink can be swapped while user code runs, which is how
//! output gets captured into log lines.

use std::cell::RefCell;
use std::io::{self, Write};

pub struct Console {
    sink: RefCell<Box<dyn Write>>,
}

impl Console {
    pub fn new(sink: Box<dyn Write>) -> Self {
        Console {
            sink: RefCell::new(sink),
        }
    }

    /// Console writing to the process stdout
    pub fn stdout() -> Self {
        Console::new(Box::new(io::stdout()))
    }

    pub fn write_str(&self, text: &str) -> io::Result<()> {
        self.sink.borrow_mut().write_all(text.as_bytes())
    }

    pub fn flush(&self) -> io::Result<()> {
        self.sink.borrow_mut().flush()
    }

    /// Install a new sink, returning the previous one
    pub fn swap(&self, sink: Box<dyn Write>) -> Box<dyn Write> {
        std::mem::replace(&mut *self.sink.borrow_mut(), sink)
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Console")
    }
}
