// Character-level helpers for field splitting.

use crate::error::ConfigError;

/// Field delimiter: a lead character, optionally followed by more characters
/// (e.g. `",|"` has lead `,` and following string `|`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    lead: char,
    following: Option<String>,
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter {
            lead: ',',
            following: None,
        }
    }
}

impl Delimiter {
    /// Build a delimiter from its string form. Empty strings are rejected.
    pub fn new(delimiter: &str) -> Result<Self, ConfigError> {
        let mut chars = delimiter.chars();
        let lead = chars.next().ok_or(ConfigError::EmptyDelimiter)?;
        let rest = chars.as_str();
        Ok(Delimiter {
            lead,
            following: if rest.is_empty() {
                None
            } else {
                Some(rest.to_string())
            },
        })
    }

    pub fn lead(&self) -> char {
        self.lead
    }

    pub fn following(&self) -> Option<&str> {
        self.following.as_deref()
    }

    /// Check if a scanned character is the delimiter's lead character.
    /// `None` is the end-of-line sentinel and never matches.
    #[inline]
    pub fn is_lead(&self, c: Option<char>) -> bool {
        c == Some(self.lead)
    }

    /// Match the following string at byte offset `pos` of `line`.
    /// Returns the byte length to consume (0 for single-character delimiters),
    /// or `None` if the rest of the delimiter is not there.
    #[inline]
    pub fn match_following(&self, line: &str, pos: usize) -> Option<usize> {
        match &self.following {
            None => Some(0),
            Some(rest) => match line.get(pos..) {
                Some(tail) if tail.starts_with(rest.as_str()) => Some(rest.len()),
                _ => None,
            },
        }
    }

    /// Full string form, as configured.
    pub fn as_string(&self) -> String {
        let mut s = String::with_capacity(1 + self.following.as_ref().map_or(0, |f| f.len()));
        s.push(self.lead);
        if let Some(rest) = &self.following {
            s.push_str(rest);
        }
        s
    }
}

/// Trimming only considers the ASCII space character.
#[inline]
pub fn is_space(c: Option<char>) -> bool {
    c == Some(' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_delimiter_rejected() {
        assert_eq!(Delimiter::new(""), Err(ConfigError::EmptyDelimiter));
    }

    #[test]
    fn test_single_char_delimiter() {
        let d = Delimiter::new(",").unwrap();
        assert_eq!(d.lead(), ',');
        assert_eq!(d.following(), None);
        assert!(d.is_lead(Some(',')));
        assert!(!d.is_lead(None));
        assert_eq!(d.match_following("a,b", 2), Some(0));
    }

    #[test]
    fn test_multi_char_delimiter() {
        let d = Delimiter::new(",|").unwrap();
        assert_eq!(d.lead(), ',');
        assert_eq!(d.following(), Some("|"));
        // pos is the byte offset just past the lead character
        assert_eq!(d.match_following("a,|b", 2), Some(1));
        assert_eq!(d.match_following("a,b", 2), None);
        // following string runs past the end of the line
        assert_eq!(d.match_following("a,", 2), None);
        assert_eq!(d.as_string(), ",|");
    }

    #[test]
    fn test_multibyte_lead() {
        let d = Delimiter::new("¦¦").unwrap();
        assert_eq!(d.lead(), '¦');
        assert_eq!(d.following(), Some("¦"));
        assert_eq!(d.match_following("a¦¦b", 3), Some(2));
    }

    #[test]
    fn test_is_space() {
        assert!(is_space(Some(' ')));
        assert!(!is_space(Some('\t')));
        assert!(!is_space(None));
    }
}
