// Line sources feeding the tokenizer
//
// A line source hands out one physical line at a time (terminator removed)
// and knows where one file ends and the next begins. It starts positioned
// before its first file: `next_file` must be called to open it.

use crate::core::{split_lines, strip_line_terminator};
use crate::error::TokenizerError;
use std::collections::VecDeque;
use std::io::BufRead;

/// Supplier of physical lines, possibly spanning several files.
pub trait LineSource {
    /// Next line of the current file, or `None` at its end.
    fn poll(&mut self) -> Result<Option<String>, TokenizerError>;

    /// Open the next file. Returns false when there are no more files.
    fn next_file(&mut self) -> Result<bool, TokenizerError>;
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn poll(&mut self) -> Result<Option<String>, TokenizerError> {
        (**self).poll()
    }

    fn next_file(&mut self) -> Result<bool, TokenizerError> {
        (**self).next_file()
    }
}

impl<S: LineSource + ?Sized> LineSource for &mut S {
    fn poll(&mut self) -> Result<Option<String>, TokenizerError> {
        (**self).poll()
    }

    fn next_file(&mut self) -> Result<bool, TokenizerError> {
        (**self).next_file()
    }
}

// ============================================================================
// In-memory texts
// ============================================================================

/// Line source over owned in-memory texts, one per file.
#[derive(Debug, Default)]
pub struct TextLineSource {
    files: VecDeque<String>,
    lines: VecDeque<String>,
}

impl TextLineSource {
    pub fn new<I, T>(files: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        TextLineSource {
            files: files.into_iter().map(Into::into).collect(),
            lines: VecDeque::new(),
        }
    }

    /// Single-file source.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new([text.into()])
    }

    /// Single-file source from already split lines.
    pub fn from_lines<I, T>(lines: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut text = String::new();
        for line in lines {
            text.push_str(line.as_ref());
            text.push('\n');
        }
        Self::from_text(text)
    }

    /// Files not opened yet.
    pub fn remaining_files(&self) -> usize {
        self.files.len()
    }
}

impl LineSource for TextLineSource {
    fn poll(&mut self) -> Result<Option<String>, TokenizerError> {
        Ok(self.lines.pop_front())
    }

    fn next_file(&mut self) -> Result<bool, TokenizerError> {
        match self.files.pop_front() {
            Some(text) => {
                self.lines = split_lines(&text).map(str::to_string).collect();
                Ok(true)
            }
            None => {
                self.lines.clear();
                Ok(false)
            }
        }
    }
}

// ============================================================================
// Buffered readers
// ============================================================================

/// Line source over buffered readers, one per file. Input must be UTF-8.
pub struct ReaderLineSource<R> {
    pending: VecDeque<R>,
    current: Option<R>,
}

impl<R: BufRead> ReaderLineSource<R> {
    pub fn new<I: IntoIterator<Item = R>>(readers: I) -> Self {
        ReaderLineSource {
            pending: readers.into_iter().collect(),
            current: None,
        }
    }
}

impl<R: BufRead> LineSource for ReaderLineSource<R> {
    fn poll(&mut self) -> Result<Option<String>, TokenizerError> {
        let reader = match self.current.as_mut() {
            Some(reader) => reader,
            None => return Ok(None),
        };
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        strip_line_terminator(&mut line);
        Ok(Some(line))
    }

    fn next_file(&mut self) -> Result<bool, TokenizerError> {
        self.current = self.pending.pop_front();
        Ok(self.current.is_some())
    }
}
