// Incremental CSV tokenizer
//
// Pull-based: the caller drives it record by record and column by column.
//
//   next_record -> (has_next_column -> next_column | next_column_or_null)* -> next_record
//
// next_file and skip_header_line are only meaningful between records.
// After any data error the caller must call skip_current_line before the
// next next_record, so held-back lines and the line counter stay consistent.

pub mod column;
pub mod cursor;

use crate::config::TokenizerConfig;
use crate::core::Field;
use crate::error::{ConfigError, TokenizerError};
use crate::source::LineSource;
use column::ColumnScanner;
use cursor::LineCursor;
use tracing::debug;

/// Whether the current record still has columns to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordState {
    NotEnd,
    /// Initial state; `next_record` must be called first.
    #[default]
    End,
}

/// Stateful tokenizer over one logical input stream.
pub struct CsvTokenizer<S> {
    config: TokenizerConfig,
    source: S,
    cursor: LineCursor,
    record_state: RecordState,
    was_quoted_column: bool,
}

impl<S: LineSource> CsvTokenizer<S> {
    /// Create a tokenizer, rejecting configurations that cannot work.
    pub fn new(config: TokenizerConfig, source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(CsvTokenizer {
            config,
            source,
            cursor: LineCursor::new(),
            record_state: RecordState::End,
            was_quoted_column: false,
        })
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    pub fn record_state(&self) -> RecordState {
        self.record_state
    }

    /// 1-based number of the current line within the current file.
    pub fn current_line_number(&self) -> u64 {
        self.cursor.line_number()
    }

    /// Text of the current physical line, if any.
    pub fn current_line(&self) -> Option<&str> {
        self.cursor.line()
    }

    /// Advance the source to its next file. Resets the line counter on success.
    pub fn next_file(&mut self) -> Result<bool, TokenizerError> {
        let next = self.source.next_file()?;
        if next {
            self.cursor.reset_line_number();
            debug!("opened next file");
        }
        Ok(next)
    }

    /// Consume one line from the source without parsing it.
    pub fn skip_header_line(&mut self) -> Result<bool, TokenizerError> {
        let skipped = self.source.poll()?.is_some();
        if skipped {
            self.cursor.count_line();
        }
        Ok(skipped)
    }

    /// Start the next record. With `skip_empty_line`, blank lines and
    /// comment lines are passed over (but still counted).
    ///
    /// Fails with `TooManyColumns` if the previous record was not drained.
    /// Returns false at end of input.
    pub fn next_record(&mut self, skip_empty_line: bool) -> Result<bool, TokenizerError> {
        if self.record_state != RecordState::End {
            return Err(TokenizerError::TooManyColumns);
        }

        let comment_marker = self
            .config
            .comment_line_marker
            .as_deref()
            .filter(|marker| !marker.is_empty());
        let has_next = self.cursor.next_line(&mut self.source, |line| {
            skip_empty_line
                && (line.is_empty() || comment_marker.is_some_and(|m| line.starts_with(m)))
        })?;

        if has_next {
            self.record_state = RecordState::NotEnd;
        }
        Ok(has_next)
    }

    pub fn has_next_column(&self) -> bool {
        self.record_state == RecordState::NotEnd
    }

    /// Read the next column of the current record as raw text.
    pub fn next_column(&mut self) -> Result<String, TokenizerError> {
        self.next_field().map(|field| field.value)
    }

    /// Read the next column with its quoting flag.
    pub fn next_field(&mut self) -> Result<Field, TokenizerError> {
        if !self.has_next_column() {
            return Err(TokenizerError::TooFewColumns);
        }
        if !self.cursor.has_line() {
            return Err(TokenizerError::EndOfInput);
        }

        self.was_quoted_column = false;
        self.cursor.clear_held_lines();

        let column = ColumnScanner::new(&self.config, &mut self.cursor, &mut self.source).scan()?;
        self.was_quoted_column = column.field.was_quoted;
        if column.ends_record {
            self.record_state = RecordState::End;
        }
        Ok(column.field)
    }

    /// Read the next column, applying null semantics: with a null string
    /// configured, a field equal to it is `None` (quoted or not); otherwise
    /// an empty unquoted field is `None` and `""` stays an empty string.
    pub fn next_column_or_null(&mut self) -> Result<Option<String>, TokenizerError> {
        let field = self.next_field()?;
        Ok(field.into_nullable(self.config.null_string.as_deref()))
    }

    /// Whether the most recently read column was quoted.
    pub fn was_quoted_column(&self) -> bool {
        self.was_quoted_column
    }

    /// Abandon the current record and return the line it started on.
    /// Lines read ahead for a multi-line quoted value are given back and
    /// will be read again by the next `next_record`.
    pub fn skip_current_line(&mut self) -> Option<String> {
        let held = self.cursor.held_line_count();
        let skipped = self.cursor.skip_current_line();
        self.record_state = RecordState::End;
        debug!(
            line_number = self.cursor.line_number(),
            given_back = self.cursor.pending_line_count(),
            held_lines = held,
            "skipped current record"
        );
        skipped
    }

    /// Read every remaining column of the current record.
    pub fn read_record(&mut self) -> Result<Vec<Option<String>>, TokenizerError> {
        let mut fields = Vec::new();
        while self.has_next_column() {
            fields.push(self.next_column_or_null()?);
        }
        Ok(fields)
    }

    pub fn into_source(self) -> S {
        self.source
    }
}
