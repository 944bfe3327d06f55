// Column state machine
//
// A ColumnScanner is created for every column read and owns the per-column
// scratch state (value bounds, quoted accumulator). Each state has its own
// transition function returning a Step; the loop in `scan` only feeds
// characters and applies steps.

use crate::config::TokenizerConfig;
use crate::core::{is_space, Field};
use crate::error::TokenizerError;
use crate::source::LineSource;
use crate::tokenizer::cursor::LineCursor;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnState {
    Begin,
    FirstTrim,
    Value,
    LastTrimOrValue,
    QuotedValue,
    AfterQuotedValue,
}

/// Outcome of feeding one character to the current state.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Stay,
    Goto(ColumnState),
    /// Field complete. `ends_record` is true when end of line (not a
    /// delimiter) terminated it.
    Emit { value: String, ends_record: bool },
}

/// A finished column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedColumn {
    pub field: Field,
    pub ends_record: bool,
}

pub struct ColumnScanner<'a, S: ?Sized> {
    config: &'a TokenizerConfig,
    cursor: &'a mut LineCursor,
    source: &'a mut S,
    state: ColumnState,
    value_start: usize,
    value_end: usize,
    quoted: String,
    /// Characters in `quoted`, checked against the size limit.
    quoted_len: u64,
    was_quoted: bool,
}

impl<'a, S: LineSource + ?Sized> ColumnScanner<'a, S> {
    pub fn new(config: &'a TokenizerConfig, cursor: &'a mut LineCursor, source: &'a mut S) -> Self {
        let value_start = cursor.pos();
        ColumnScanner {
            config,
            cursor,
            source,
            state: ColumnState::Begin,
            value_start,
            value_end: value_start,
            quoted: String::new(),
            quoted_len: 0,
            was_quoted: false,
        }
    }

    /// Read one column, consuming its terminating delimiter or end of line.
    pub fn scan(mut self) -> Result<ScannedColumn, TokenizerError> {
        loop {
            let at = self.cursor.pos();
            let c = self.cursor.next_char();

            let step = match self.state {
                ColumnState::Begin => self.begin(c, at),
                ColumnState::FirstTrim => self.first_trim(c, at),
                ColumnState::Value => self.value(c, at),
                ColumnState::LastTrimOrValue => self.last_trim_or_value(c),
                ColumnState::QuotedValue => self.quoted_value(c)?,
                ColumnState::AfterQuotedValue => self.after_quoted_value(c)?,
            };

            match step {
                Step::Stay => {}
                Step::Goto(next) => self.state = next,
                Step::Emit { value, ends_record } => {
                    return Ok(ScannedColumn {
                        field: Field {
                            value,
                            was_quoted: self.was_quoted,
                        },
                        ends_record,
                    });
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Character classes
    // ------------------------------------------------------------------------

    #[inline]
    fn is_quote(&self, c: Option<char>) -> bool {
        c.is_some() && c == self.config.quote
    }

    #[inline]
    fn is_escape(&self, c: Option<char>) -> bool {
        c.is_some() && c == self.config.escape
    }

    #[inline]
    fn is_delimiter_lead_or_eol(&self, c: Option<char>) -> bool {
        c.is_none() || self.config.delimiter.is_lead(c)
    }

    /// True if `c` starts a full delimiter; the rest of it is consumed.
    /// A lead character without its following string is not a delimiter.
    fn take_delimiter(&mut self, c: Option<char>) -> bool {
        if !self.config.delimiter.is_lead(c) {
            return false;
        }
        let line = self.cursor.line().unwrap_or("");
        match self.config.delimiter.match_following(line, self.cursor.pos()) {
            Some(len) => {
                self.cursor.advance(len);
                true
            }
            None => false,
        }
    }

    fn open_quote(&mut self) -> Step {
        self.was_quoted = true;
        self.quoted.clear();
        self.quoted_len = 0;
        Step::Goto(ColumnState::QuotedValue)
    }

    fn push_quoted(&mut self, c: char) {
        self.quoted.push(c);
        self.quoted_len += 1;
    }

    fn push_quoted_checked(&mut self, c: char) -> Result<(), TokenizerError> {
        if self.quoted_len + 1 > self.config.max_quoted_size_limit {
            return Err(TokenizerError::QuotedSizeLimitExceeded {
                limit: self.config.max_quoted_size_limit,
            });
        }
        self.push_quoted(c);
        Ok(())
    }

    fn emit_slice(&self, start: usize, end: usize, ends_record: bool) -> Step {
        Step::Emit {
            value: self.cursor.slice(start, end).to_string(),
            ends_record,
        }
    }

    fn emit_quoted(&mut self, ends_record: bool) -> Step {
        Step::Emit {
            value: std::mem::take(&mut self.quoted),
            ends_record,
        }
    }

    // ------------------------------------------------------------------------
    // States
    // ------------------------------------------------------------------------

    fn begin(&mut self, c: Option<char>, at: usize) -> Step {
        if self.take_delimiter(c) {
            return self.emit_slice(at, at, false);
        }
        if c.is_none() {
            return self.emit_slice(at, at, true);
        }
        if self.config.trim_if_not_quoted && is_space(c) {
            Step::Goto(ColumnState::FirstTrim)
        } else if self.is_quote(c) {
            self.open_quote()
        } else {
            self.value_start = at;
            Step::Goto(ColumnState::Value)
        }
    }

    fn first_trim(&mut self, c: Option<char>, at: usize) -> Step {
        if self.take_delimiter(c) {
            return self.emit_slice(at, at, false);
        }
        if c.is_none() {
            return self.emit_slice(at, at, true);
        }
        if self.is_quote(c) {
            // leading spaces before a quote: still a quoted field
            self.open_quote()
        } else if is_space(c) {
            Step::Stay
        } else {
            self.value_start = at;
            Step::Goto(ColumnState::Value)
        }
    }

    fn value(&mut self, c: Option<char>, at: usize) -> Step {
        if self.take_delimiter(c) {
            return self.emit_slice(self.value_start, at, false);
        }
        if c.is_none() {
            return self.emit_slice(self.value_start, at, true);
        }
        if self.config.trim_if_not_quoted && is_space(c) {
            // possibly the end of the value
            self.value_end = at;
            Step::Goto(ColumnState::LastTrimOrValue)
        } else {
            Step::Stay
        }
    }

    fn last_trim_or_value(&mut self, c: Option<char>) -> Step {
        if self.take_delimiter(c) {
            return self.emit_slice(self.value_start, self.value_end, false);
        }
        if c.is_none() {
            return self.emit_slice(self.value_start, self.value_end, true);
        }
        if is_space(c) {
            Step::Stay
        } else {
            // the spaces were inside the value
            Step::Goto(ColumnState::Value)
        }
    }

    fn quoted_value(&mut self, c: Option<char>) -> Result<Step, TokenizerError> {
        let ch = match c {
            Some(ch) => ch,
            None => {
                self.continue_on_next_line()?;
                return Ok(Step::Stay);
            }
        };

        // quote is checked before escape, so quote == escape means no escaping
        if self.is_quote(c) {
            let next = self.cursor.peek_char();
            let after_next = self.cursor.peek_second_char();
            let stray = self.config.quotes_in_quoted_fields.accepts_stray_quotes();

            if self.is_quote(next) && !(stray && self.is_delimiter_lead_or_eol(after_next)) {
                // doubled quote; under the stray policy a doubled quote right
                // before a delimiter or end of line is a closing quote instead
                self.push_quoted(ch);
                self.cursor.advance(ch.len_utf8());
                Ok(Step::Stay)
            } else if stray && !self.is_delimiter_lead_or_eol(next) {
                self.push_quoted_checked(ch)?;
                Ok(Step::Stay)
            } else {
                Ok(Step::Goto(ColumnState::AfterQuotedValue))
            }
        } else if self.is_escape(c) {
            match self.cursor.peek_char() {
                Some(next) if self.is_quote(Some(next)) || self.is_escape(Some(next)) => {
                    self.push_quoted(next);
                    self.cursor.advance(next.len_utf8());
                }
                _ => self.push_quoted(ch),
            }
            Ok(Step::Stay)
        } else {
            self.push_quoted_checked(ch)?;
            Ok(Step::Stay)
        }
    }

    /// End of a physical line inside quotes: the value goes on.
    fn continue_on_next_line(&mut self) -> Result<(), TokenizerError> {
        for nl in self.config.newline.as_str().chars() {
            self.push_quoted(nl);
        }
        self.cursor.hold_current_line();
        if !self.cursor.next_line(&mut *self.source, |_| false)? {
            return Err(TokenizerError::invalid_value(
                "Unexpected end of line during parsing a quoted value",
            ));
        }
        trace!(
            line_number = self.cursor.line_number(),
            held_lines = self.cursor.held_line_count(),
            "quoted value continues on next line"
        );
        Ok(())
    }

    fn after_quoted_value(&mut self, c: Option<char>) -> Result<Step, TokenizerError> {
        if self.take_delimiter(c) {
            return Ok(self.emit_quoted(false));
        }
        match c {
            None => Ok(self.emit_quoted(true)),
            Some(' ') => Ok(Step::Stay),
            Some(ch) => Err(TokenizerError::invalid_value(format!(
                "Unexpected extra character '{}' after a value quoted by '{}'",
                ch,
                self.config.quote.unwrap_or('"')
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuotesInQuotedFields;
    use crate::source::TextLineSource;

    /// Scan every column of the first record of `text`.
    fn scan_record(config: &TokenizerConfig, text: &str) -> Result<Vec<Field>, TokenizerError> {
        let mut source = TextLineSource::from_text(text);
        source.next_file()?;
        let mut cursor = LineCursor::new();
        assert!(cursor.next_line(&mut source, |_| false)?);

        let mut fields = Vec::new();
        loop {
            let column = ColumnScanner::new(config, &mut cursor, &mut source).scan()?;
            fields.push(column.field);
            if column.ends_record {
                return Ok(fields);
            }
        }
    }

    fn values(fields: Vec<Field>) -> Vec<String> {
        fields.into_iter().map(|f| f.value).collect()
    }

    #[test]
    fn test_begin_empty_fields() {
        let config = TokenizerConfig::default();
        let fields = scan_record(&config, ",,").unwrap();
        assert_eq!(values(fields), vec!["", "", ""]);
    }

    #[test]
    fn test_value_plain() {
        let config = TokenizerConfig::default();
        let fields = scan_record(&config, "abc,de f").unwrap();
        assert_eq!(values(fields), vec!["abc", "de f"]);
    }

    #[test]
    fn test_spaces_kept_without_trim() {
        let config = TokenizerConfig::default();
        let fields = scan_record(&config, " a , b ").unwrap();
        assert_eq!(values(fields), vec![" a ", " b "]);
    }

    #[test]
    fn test_first_trim_and_last_trim() {
        let config = TokenizerConfig::default().with_trim_if_not_quoted(true);
        let fields = scan_record(&config, "  a b  ,   ,c").unwrap();
        assert_eq!(values(fields), vec!["a b", "", "c"]);
    }

    #[test]
    fn test_first_trim_then_quote() {
        let config = TokenizerConfig::default().with_trim_if_not_quoted(true);
        let fields = scan_record(&config, "  \" a \"  ,b").unwrap();
        assert!(fields[0].was_quoted);
        assert_eq!(values(fields), vec![" a ", "b"]);
    }

    #[test]
    fn test_multi_char_delimiter_lead_alone_is_content() {
        let config = TokenizerConfig::new(",|").unwrap();
        let fields = scan_record(&config, "a,b,|c,|,").unwrap();
        assert_eq!(values(fields), vec!["a,b", "c", ","]);
    }

    #[test]
    fn test_quoted_with_delimiter_inside() {
        let config = TokenizerConfig::default();
        let fields = scan_record(&config, "\"a,b\",c").unwrap();
        assert!(fields[0].was_quoted);
        assert!(!fields[1].was_quoted);
        assert_eq!(values(fields), vec!["a,b", "c"]);
    }

    #[test]
    fn test_escape_character_inside_quotes() {
        let config = TokenizerConfig::default();
        let fields = scan_record(&config, r#""a\"b\\c\d",e"#).unwrap();
        assert_eq!(values(fields), vec![r#"a"b\c\d"#, "e"]);
    }

    #[test]
    fn test_quote_equal_to_escape_never_escapes() {
        let config = TokenizerConfig::default().with_escape(Some('"'));
        let fields = scan_record(&config, "\"a\"\"b\",c").unwrap();
        assert_eq!(values(fields), vec!["a\"b", "c"]);
    }

    #[test]
    fn test_after_quoted_value_rejects_content() {
        let config = TokenizerConfig::default();
        let err = scan_record(&config, "\"a\"b,c").unwrap_err();
        assert!(matches!(err, TokenizerError::InvalidValue(_)));
        assert_eq!(
            err.to_string(),
            "Unexpected extra character 'b' after a value quoted by '\"'"
        );
    }

    #[test]
    fn test_after_quoted_value_absorbs_spaces() {
        let config = TokenizerConfig::default();
        let fields = scan_record(&config, "\"a\"  ,\"b\" ").unwrap();
        assert_eq!(values(fields), vec!["a", "b"]);
    }

    #[test]
    fn test_stray_quote_kept_as_content() {
        let config = TokenizerConfig::default().with_quotes_in_quoted_fields(
            QuotesInQuotedFields::AcceptStrayQuotesAssumingNoDelimitersInFields,
        );
        let fields = scan_record(&config, "\"a\"b\",c").unwrap();
        assert_eq!(values(fields), vec!["a\"b", "c"]);
    }

    #[test]
    fn test_stray_policy_doubled_quote_before_delimiter_closes() {
        let config = TokenizerConfig::default().with_quotes_in_quoted_fields(
            QuotesInQuotedFields::AcceptStrayQuotesAssumingNoDelimitersInFields,
        );
        // `""` right before `,`: first quote is a stray, second one closes
        let fields = scan_record(&config, "\"a\"\",c").unwrap();
        assert_eq!(values(fields), vec!["a\"", "c"]);
    }

    #[test]
    fn test_rfc4180_policy_rejects_stray_quote() {
        let config = TokenizerConfig::default();
        assert!(scan_record(&config, "\"a\"b\",c").is_err());
    }

    #[test]
    fn test_size_limit_counts_characters() {
        let config = TokenizerConfig::default().with_max_quoted_size_limit(3);
        let fields = scan_record(&config, "\"äöü\"").unwrap();
        assert_eq!(values(fields), vec!["äöü"]);

        let err = scan_record(&config, "\"äöüx\"").unwrap_err();
        assert!(matches!(
            err,
            TokenizerError::QuotedSizeLimitExceeded { limit: 3 }
        ));
    }

    #[test]
    fn test_no_quote_configured() {
        let config = TokenizerConfig::default().with_quote(None);
        let fields = scan_record(&config, "\"a,b\"").unwrap();
        assert!(!fields[0].was_quoted);
        assert_eq!(values(fields), vec!["\"a", "b\""]);
    }
}
