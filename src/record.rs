// Header-keyed records on top of the tokenizer
//
// The first record of the first file names the columns. Every following
// record becomes an ordered list of (header, value) pairs. Later files are
// expected to repeat the header line, which is skipped.

use crate::error::TokenizerError;
use crate::source::LineSource;
use crate::tokenizer::CsvTokenizer;
use tracing::debug;

/// One record: `(header, value)` pairs in column order. `None` is null.
pub type Record = Vec<(String, Option<String>)>;

pub struct RecordIterator<S> {
    tokenizer: CsvTokenizer<S>,
    headers: Vec<String>,
    finished: bool,
}

impl<S: LineSource> RecordIterator<S> {
    /// Open the first file and read its header record.
    pub fn new(mut tokenizer: CsvTokenizer<S>) -> Result<Self, TokenizerError> {
        if !tokenizer.next_file()? {
            return Err(TokenizerError::invalid_value("Can't read extract input stream"));
        }

        let mut headers = Vec::new();
        if tokenizer.next_record(true)? {
            while tokenizer.has_next_column() {
                headers.push(tokenizer.next_column()?);
            }
        }

        Ok(RecordIterator {
            tokenizer,
            headers,
            finished: false,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn tokenizer(&self) -> &CsvTokenizer<S> {
        &self.tokenizer
    }

    /// Start the next record, moving on to later files as needed.
    fn advance(&mut self) -> Result<bool, TokenizerError> {
        loop {
            if self.tokenizer.next_record(true)? {
                return Ok(true);
            }
            if !self.tokenizer.next_file()? {
                return Ok(false);
            }
            self.tokenizer.skip_header_line()?;
        }
    }

    /// Missing trailing columns are left out; extra ones are an error.
    fn read_record(&mut self) -> Result<Record, TokenizerError> {
        let values = self.tokenizer.read_record()?;
        if values.len() > self.headers.len() {
            return Err(TokenizerError::TooManyColumns);
        }
        Ok(self.headers.iter().cloned().zip(values).collect())
    }
}

impl<S: LineSource> Iterator for RecordIterator<S> {
    type Item = Result<Record, TokenizerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.advance() {
            Ok(true) => {}
            Ok(false) => {
                self.finished = true;
                return None;
            }
            Err(err) => {
                self.finished = true;
                return Some(Err(err));
            }
        }

        match self.read_record() {
            Ok(record) => Some(Ok(record)),
            Err(err) => {
                if let TokenizerError::Io(_) = err {
                    self.finished = true;
                }
                let skipped = self.tokenizer.skip_current_line();
                debug!(
                    line_number = self.tokenizer.current_line_number(),
                    skipped = skipped.as_deref().unwrap_or(""),
                    error = %err,
                    "dropping malformed record"
                );
                Some(Err(err))
            }
        }
    }
}
