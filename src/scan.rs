//! Sub-scanners used by the fingerprint builder.
//!
//! Each scanner receives the remaining input starting at the byte that
//! triggered it and returns how many bytes the token spans. A non-empty
//! input always yields at least 1, so the caller's cursor always advances.

use tracing::trace;

use crate::charset::Charset;

/// Shape of a `/*` comment found at the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comment {
    /// `/*!` optimizer hint. Kept in the fingerprint.
    Hint,
    /// Plain block comment spanning `len` bytes, delimiters included.
    Block { len: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NumberState {
    Integer,
    Fraction,
    Exponent,
}

pub fn is_quote(b: u8) -> bool {
    matches!(b, b'\'' | b'"' | b'`')
}

/// Length of the quoted literal at the start of `text`, both delimiters
/// included. Unterminated literals run to the end of the input.
pub fn quote_end(text: &[u8], charset: Charset) -> usize {
    let len = text.len();
    if len < 2 || !is_quote(text[0]) {
        return len.min(1);
    }

    let delim = text[0];
    let latin1 = charset == Charset::Latin1;
    let gbk = charset == Charset::Gbk;
    let mut utf8 = charset == Charset::Utf8;

    let mut i = 1;
    while i < len {
        let b = text[i];
        if !latin1
            && !gbk
            && i + 2 < len
            && b & 0xE0 == 0xE0
            && (utf8 || (text[i + 1] & 0x80 != 0 && text[i + 2] & 0x80 != 0))
        {
            // 3-byte UTF-8 sequence: continuation bytes are never delimiters.
            i += 2;
            utf8 = true;
        } else if b == b'\\' {
            if i + 1 < len {
                i += 1;
            }
        } else if !latin1 && !utf8 && b >= 0x81 {
            // GBK lead byte swallows a valid trail byte.
            if i + 1 < len && (0x40..=0xFE).contains(&text[i + 1]) {
                i += 1;
            }
        } else if b == delim {
            return i + 1;
        }
        i += 1;
    }

    trace!("unterminated {} literal, consuming {len} bytes", delim as char);
    len
}

/// Like [`quote_end`], but a doubled delimiter (`'it''s'`) continues the
/// same literal instead of starting a new one.
pub fn literal_end(text: &[u8], charset: Charset) -> usize {
    let mut end = quote_end(text, charset);
    while end > 1 && end < text.len() && text[end] == text[0] {
        end += quote_end(&text[end..], charset);
    }
    end
}

/// Length of the run of hex digits at the start of `text`.
pub fn hex_end(text: &[u8]) -> usize {
    text.iter().take_while(|b| b.is_ascii_hexdigit()).count()
}

/// Length of the numeric literal at the start of `text`.
///
/// Accepts `0x` hex literals and decimals of the form `73.47E-6`. The
/// first byte is always consumed.
pub fn number_end(text: &[u8]) -> usize {
    let len = text.len();
    if len > 2 && text[0] == b'0' && matches!(text[1], b'x' | b'X') {
        return 2 + hex_end(&text[2..]);
    }

    let mut state = if text.first() == Some(&b'.') {
        NumberState::Fraction
    } else {
        NumberState::Integer
    };

    let mut i = 1;
    while i < len {
        let b = text[i];
        match state {
            _ if b.is_ascii_digit() => {}
            NumberState::Integer if b == b'.' => state = NumberState::Fraction,
            NumberState::Fraction if b == b'e' || b == b'E' => {
                state = NumberState::Exponent;
                if text.get(i + 1) == Some(&b'-') {
                    i += 1;
                }
            }
            _ => return i,
        }
        i += 1;
    }
    len
}

/// Classify the comment opening at the start of `text`, or `None` when the
/// text does not start with `/*`.
pub fn comment(text: &[u8]) -> Option<Comment> {
    if !text.starts_with(b"/*") {
        return None;
    }
    if text.get(2) == Some(&b'!') {
        return Some(Comment::Hint);
    }
    let len = match find_close(text, 2) {
        Some(end) => end,
        None => {
            trace!("unterminated comment, consuming {} bytes", text.len());
            text.len()
        }
    };
    Some(Comment::Block { len })
}

/// Offset just past the first `*/` whose `*` sits at or after `from`.
fn find_close(text: &[u8], from: usize) -> Option<usize> {
    text.get(from..)?
        .windows(2)
        .position(|w| w == b"*/")
        .map(|pos| from + pos + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_simple() {
        assert_eq!(quote_end(b"'bob' and", Charset::Latin1), 5);
        assert_eq!(quote_end(b"\"bob\"", Charset::Utf8), 5);
        assert_eq!(quote_end(b"`col` = 1", Charset::Unspecified), 5);
    }

    #[test]
    fn test_quote_other_delimiter_ignored() {
        assert_eq!(quote_end(b"'it\"s' x", Charset::Latin1), 6);
    }

    #[test]
    fn test_quote_backslash_escape() {
        assert_eq!(quote_end(br"'it\'s' x", Charset::Latin1), 7);
        assert_eq!(quote_end(br"'a\\' x", Charset::Latin1), 5);
    }

    #[test]
    fn test_quote_unterminated_consumes_rest() {
        assert_eq!(quote_end(b"'never closed", Charset::Latin1), 13);
        assert_eq!(quote_end(br"'ends in escape\'", Charset::Utf8), 17);
    }

    #[test]
    fn test_quote_not_a_quote() {
        assert_eq!(quote_end(b"abc", Charset::Latin1), 1);
        assert_eq!(quote_end(b"'", Charset::Latin1), 1);
        assert_eq!(quote_end(b"", Charset::Latin1), 0);
    }

    #[test]
    fn test_literal_doubled_delimiter() {
        assert_eq!(literal_end(b"'it''s' x", Charset::Latin1), 7);
        assert_eq!(literal_end(b"'a' 'b'", Charset::Latin1), 3);
        assert_eq!(literal_end(b"\"say \"\"hi\"\"\"", Charset::Utf8), 12);
    }

    #[test]
    fn test_quote_gbk_trail_byte_backslash() {
        // 0x95 0x5C is one GBK character whose trail byte is a backslash.
        let text = b"'\x95\x5c' rest";
        assert_eq!(quote_end(text, Charset::Gbk), 4);
        // Latin1 sees an escaped quote and runs to the end.
        assert_eq!(quote_end(text, Charset::Latin1), text.len());
    }

    #[test]
    fn test_quote_gbk_trail_byte_equals_delimiter() {
        // 0x81 0x60: trail byte is a backtick.
        let text = b"`\x81\x60x` tail";
        assert_eq!(quote_end(text, Charset::Gbk), 5);
        assert_eq!(quote_end(text, Charset::Latin1), 3);
    }

    #[test]
    fn test_quote_utf8_three_byte_sequence() {
        // U+4E2D is E4 B8 AD.
        let text = "'中' x".as_bytes();
        assert_eq!(quote_end(text, Charset::Utf8), 5);
        assert_eq!(quote_end(text, Charset::Unspecified), 5);
    }

    #[test]
    fn test_number_integer_and_float() {
        assert_eq!(number_end(b"123 "), 3);
        assert_eq!(number_end(b"73.47E-6,"), 8);
        assert_eq!(number_end(b"1.5e10)"), 6);
        assert_eq!(number_end(b".5 "), 2);
    }

    #[test]
    fn test_number_stops_at_second_dot() {
        assert_eq!(number_end(b"1.2.3"), 3);
        assert_eq!(number_end(b"..x"), 1);
    }

    #[test]
    fn test_number_exponent_requires_fraction() {
        assert_eq!(number_end(b"1e5"), 1);
    }

    #[test]
    fn test_number_hex() {
        assert_eq!(number_end(b"0x1aF "), 5);
        assert_eq!(number_end(b"0Xff"), 4);
        assert_eq!(number_end(b"0xg"), 2);
        assert_eq!(number_end(b"0x"), 1);
    }

    #[test]
    fn test_number_table_qualifier() {
        assert_eq!(number_end(b"1.col"), 2);
        assert_eq!(number_end(b".col"), 1);
    }

    #[test]
    fn test_comment_block() {
        assert_eq!(comment(b"/* hi */ SELECT"), Some(Comment::Block { len: 8 }));
        assert_eq!(comment(b"/**/x"), Some(Comment::Block { len: 4 }));
    }

    #[test]
    fn test_comment_close_must_follow_opener() {
        assert_eq!(comment(b"/*/ x */"), Some(Comment::Block { len: 8 }));
    }

    #[test]
    fn test_comment_unterminated() {
        assert_eq!(comment(b"/* open"), Some(Comment::Block { len: 7 }));
    }

    #[test]
    fn test_comment_hint_and_non_comment() {
        assert_eq!(comment(b"/*!40101 SET */"), Some(Comment::Hint));
        assert_eq!(comment(b"/ 2"), None);
    }
}
