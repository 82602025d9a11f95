//! Line-oriented text sources.

use std::io::BufRead;

use crate::error::InpError;

/// A source of physical lines.
pub trait LineSource {
    /// Next physical line without its terminator, `None` at end of input.
    fn next_line(&mut self) -> Result<Option<String>, InpError>;
}

impl<T: LineSource + ?Sized> LineSource for &mut T {
    fn next_line(&mut self) -> Result<Option<String>, InpError> {
        (**self).next_line()
    }
}

impl<T: LineSource + ?Sized> LineSource for Box<T> {
    fn next_line(&mut self) -> Result<Option<String>, InpError> {
        (**self).next_line()
    }
}

/// Lines read from any buffered reader.
pub struct ReaderLines<R> {
    reader: R,
    buf: String,
}

impl<R: BufRead> ReaderLines<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> LineSource for ReaderLines<R> {
    fn next_line(&mut self) -> Result<Option<String>, InpError> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        let line = self.buf.trim_end_matches(['\n', '\r']);
        Ok(Some(line.to_string()))
    }
}

/// Lines of an in-memory string.
pub struct StrLines<'a> {
    lines: std::str::Lines<'a>,
}

impl<'a> StrLines<'a> {
    /// Iterate over the lines of `text`.
    pub fn new(text: &'a str) -> Self {
        Self { lines: text.lines() }
    }
}

impl LineSource for StrLines<'_> {
    fn next_line(&mut self) -> Result<Option<String>, InpError> {
        Ok(self.lines.next().map(str::to_string))
    }
}
