// Newline handling for the line-oriented tokenizer.
//
// Physical lines reach the tokenizer with their terminator already removed.
// The configured `Newline` is what gets re-inserted when a quoted value
// spans several physical lines.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Newline {
    #[default]
    #[serde(rename = "CRLF")]
    Crlf,
    #[serde(rename = "LF")]
    Lf,
    #[serde(rename = "CR")]
    Cr,
}

impl Newline {
    pub fn as_str(self) -> &'static str {
        match self {
            Newline::Crlf => "\r\n",
            Newline::Lf => "\n",
            Newline::Cr => "\r",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Newline::Crlf => "CRLF",
            Newline::Lf => "LF",
            Newline::Cr => "CR",
        }
    }
}

impl fmt::Display for Newline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Newline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRLF" => Ok(Newline::Crlf),
            "LF" => Ok(Newline::Lf),
            "CR" => Ok(Newline::Cr),
            _ => Err(format!("Unsupported newline: '{}', supported values: [CRLF, LF, CR]", s)),
        }
    }
}

/// Split text into physical lines. `\n` and `\r\n` end a line, a bare `\r`
/// is data, and a trailing terminator does not produce an extra empty line.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
}

/// Remove one trailing `\n` or `\r\n` from a line read with `read_line`.
pub fn strip_line_terminator(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
}
