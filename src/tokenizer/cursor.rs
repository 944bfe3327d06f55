// Line cursor: current physical line, read position and line bookkeeping
//
// Lines consumed by a multi-line quoted value are held back so that a
// skipped record can give them back for re-reading.

use crate::error::TokenizerError;
use crate::source::LineSource;
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct LineCursor {
    /// `None` before the first record and after end of input.
    line: Option<String>,
    /// Byte offset into `line`.
    pos: usize,
    /// 1-based number of `line` within the current file.
    line_number: u64,
    /// Earlier lines of the quoted value being read, oldest first.
    held_quoted_lines: VecDeque<String>,
    /// Lines given back by a skipped record; read before the source.
    pending_reread: VecDeque<String>,
}

impl LineCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self) -> Option<&str> {
        self.line.as_deref()
    }

    pub fn has_line(&self) -> bool {
        self.line.is_some()
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    pub fn reset_line_number(&mut self) {
        self.line_number = 0;
    }

    /// Count a line consumed outside the cursor (header skipping).
    pub fn count_line(&mut self) {
        self.line_number += 1;
    }

    pub fn held_line_count(&self) -> usize {
        self.held_quoted_lines.len()
    }

    pub fn pending_line_count(&self) -> usize {
        self.pending_reread.len()
    }

    /// Consume and return the next character. `None` is the end-of-line
    /// sentinel and is returned again on every call once the line is done.
    #[inline]
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    #[inline]
    pub fn peek_char(&self) -> Option<char> {
        self.line.as_deref()?.get(self.pos..)?.chars().next()
    }

    /// The character after the one `peek_char` returns.
    #[inline]
    pub fn peek_second_char(&self) -> Option<char> {
        let mut chars = self.line.as_deref()?.get(self.pos..)?.chars();
        chars.next()?;
        chars.next()
    }

    /// Skip `bytes` bytes; callers only pass lengths of matched text.
    #[inline]
    pub fn advance(&mut self, bytes: usize) {
        self.pos += bytes;
    }

    /// Text of the current line between two byte offsets.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        self.line
            .as_deref()
            .and_then(|line| line.get(start..end))
            .unwrap_or("")
    }

    /// Load the next physical line, from the pending queue first and the
    /// source second. Lines for which `skip` returns true are counted and
    /// passed over. Returns false at end of input, leaving no current line.
    pub fn next_line<S, F>(&mut self, source: &mut S, skip: F) -> Result<bool, TokenizerError>
    where
        S: LineSource + ?Sized,
        F: Fn(&str) -> bool,
    {
        loop {
            let line = match self.pending_reread.pop_front() {
                Some(line) => line,
                None => match source.poll()? {
                    Some(line) => line,
                    None => {
                        self.line = None;
                        return Ok(false);
                    }
                },
            };
            self.pos = 0;
            self.line_number += 1;

            if !skip(&line) {
                self.line = Some(line);
                return Ok(true);
            }
        }
    }

    /// Move the current line into the held-quoted-lines buffer before a
    /// quoted value continues on the next physical line.
    pub fn hold_current_line(&mut self) {
        if let Some(line) = self.line.take() {
            self.held_quoted_lines.push_back(line);
        }
    }

    pub fn clear_held_lines(&mut self) {
        self.held_quoted_lines.clear();
    }

    /// Abandon the current record and return the line it started on.
    ///
    /// Without a multi-line quoted value in progress that is the current
    /// line. Otherwise it is the first held line; the other held lines and
    /// the current one go back in front of the pending queue, in the order
    /// they were read, and the line counter is rewound to match.
    pub fn skip_current_line(&mut self) -> Option<String> {
        let first = match self.held_quoted_lines.pop_front() {
            Some(first) => first,
            None => return self.line.clone(),
        };

        let mut giveback: Vec<String> = self.held_quoted_lines.drain(..).collect();
        if let Some(line) = self.line.take() {
            giveback.push(line);
        }
        self.line_number -= giveback.len() as u64;
        for line in giveback.into_iter().rev() {
            self.pending_reread.push_front(line);
        }
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::TextLineSource;

    fn opened(text: &str) -> TextLineSource {
        let mut source = TextLineSource::from_text(text);
        source.next_file().unwrap();
        source
    }

    #[test]
    fn test_chars_and_sentinel() {
        let mut source = opened("aé\n");
        let mut cursor = LineCursor::new();
        assert!(cursor.next_line(&mut source, |_| false).unwrap());
        assert_eq!(cursor.peek_char(), Some('a'));
        assert_eq!(cursor.peek_second_char(), Some('é'));
        assert_eq!(cursor.next_char(), Some('a'));
        assert_eq!(cursor.next_char(), Some('é'));
        assert_eq!(cursor.pos(), 3);
        assert_eq!(cursor.next_char(), None);
        assert_eq!(cursor.next_char(), None);
        assert_eq!(cursor.slice(0, 1), "a");
    }

    #[test]
    fn test_next_line_skips_and_counts() {
        let mut source = opened("\n#c\nx\n");
        let mut cursor = LineCursor::new();
        assert!(cursor
            .next_line(&mut source, |l| l.is_empty() || l.starts_with('#'))
            .unwrap());
        assert_eq!(cursor.line(), Some("x"));
        assert_eq!(cursor.line_number(), 3);
        assert!(!cursor.next_line(&mut source, |_| false).unwrap());
        assert!(!cursor.has_line());
        assert_eq!(cursor.line_number(), 3);
    }

    #[test]
    fn test_skip_without_held_lines_returns_current() {
        let mut source = opened("a,b\n");
        let mut cursor = LineCursor::new();
        cursor.next_line(&mut source, |_| false).unwrap();
        assert_eq!(cursor.skip_current_line().as_deref(), Some("a,b"));
        assert_eq!(cursor.pending_line_count(), 0);
    }

    #[test]
    fn test_skip_gives_back_held_lines_in_order() {
        let mut source = opened("l1\nl2\nl3\nl4\n");
        let mut cursor = LineCursor::new();
        cursor.next_line(&mut source, |_| false).unwrap();
        cursor.hold_current_line();
        cursor.next_line(&mut source, |_| false).unwrap();
        cursor.hold_current_line();
        cursor.next_line(&mut source, |_| false).unwrap();
        assert_eq!(cursor.line_number(), 3);
        assert_eq!(cursor.held_line_count(), 2);

        assert_eq!(cursor.skip_current_line().as_deref(), Some("l1"));
        assert_eq!(cursor.line_number(), 1);
        assert_eq!(cursor.pending_line_count(), 2);

        let mut seen = Vec::new();
        while cursor.next_line(&mut source, |_| false).unwrap() {
            seen.push((cursor.line_number(), cursor.line().unwrap().to_string()));
        }
        assert_eq!(
            seen,
            vec![
                (2, "l2".to_string()),
                (3, "l3".to_string()),
                (4, "l4".to_string())
            ]
        );
    }

    #[test]
    fn test_skip_after_end_of_input() {
        let mut source = opened("l1\nl2\n");
        let mut cursor = LineCursor::new();
        cursor.next_line(&mut source, |_| false).unwrap();
        cursor.hold_current_line();
        cursor.next_line(&mut source, |_| false).unwrap();
        cursor.hold_current_line();
        assert!(!cursor.next_line(&mut source, |_| false).unwrap());

        assert_eq!(cursor.skip_current_line().as_deref(), Some("l1"));
        assert_eq!(cursor.line_number(), 1);
        assert!(cursor.next_line(&mut source, |_| false).unwrap());
        assert_eq!(cursor.line(), Some("l2"));
        assert_eq!(cursor.line_number(), 2);
    }
}
