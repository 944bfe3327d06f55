// Field values and null substitution

/// One field as produced by the column state machine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Field {
    pub value: String,
    /// True when the field opened with the quote character, so an empty
    /// quoted field (`""`) can be told apart from an absent unquoted one.
    pub was_quoted: bool,
}

impl Field {
    pub fn unquoted(value: impl Into<String>) -> Self {
        Field {
            value: value.into(),
            was_quoted: false,
        }
    }

    pub fn quoted(value: impl Into<String>) -> Self {
        Field {
            value: value.into(),
            was_quoted: true,
        }
    }

    /// Apply null semantics, see [`apply_null_string`].
    pub fn into_nullable(self, null_string: Option<&str>) -> Option<String> {
        apply_null_string(self.value, self.was_quoted, null_string)
    }
}

/// Null semantics for a raw field.
///
/// With a null string configured, any field whose text equals it becomes
/// `None`, quoted or not. Without one, an empty unquoted field is `None`
/// while an empty quoted field stays `""`.
#[inline]
pub fn apply_null_string(value: String, was_quoted: bool, null_string: Option<&str>) -> Option<String> {
    match null_string {
        Some(marker) => {
            if value == marker {
                None
            } else {
                Some(value)
            }
        }
        None => {
            if value.is_empty() && !was_quoted {
                None
            } else {
                Some(value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_unquoted_is_null_without_marker() {
        assert_eq!(apply_null_string(String::new(), false, None), None);
    }

    #[test]
    fn test_empty_quoted_stays_empty_without_marker() {
        assert_eq!(
            apply_null_string(String::new(), true, None),
            Some(String::new())
        );
    }

    #[test]
    fn test_marker_matches_unquoted() {
        assert_eq!(apply_null_string("NULL".into(), false, Some("NULL")), None);
        assert_eq!(
            apply_null_string(String::new(), false, Some("NULL")),
            Some(String::new())
        );
    }

    #[test]
    fn test_marker_matches_quoted_too() {
        // A quoted field whose content equals the marker is also null
        assert_eq!(Field::quoted("NULL").into_nullable(Some("NULL")), None);
        assert_eq!(
            Field::unquoted("null").into_nullable(Some("NULL")),
            Some("null".to_string())
        );
    }
}
