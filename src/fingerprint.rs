use serde::Serialize;
use tracing::trace;

use crate::charset::Charset;
use crate::classify::{Classifier, StatementType};
use crate::lists;
use crate::scan::{self, Comment};

/// Normalized statement plus its coarse type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FingerPrint {
    pub statement_type: StatementType,
    pub fingerprint: String,
}

impl FingerPrint {
    /// Classify an already normalized fingerprint.
    pub fn classified(fingerprint: String, classifier: &Classifier) -> Self {
        let statement_type = classifier.classify(&fingerprint);
        Self {
            statement_type,
            fingerprint,
        }
    }
}

/// Normalize SQL into a fingerprint by replacing literals with placeholders.
///
/// - String literals 'foo' and "foo" → 's'
/// - Numeric literals (decimal, float, hex) → 1
/// - IN (1, 2, 3) → IN(1), IN ('a', 'b') → IN('s')
/// - VALUES (...), (...) → VALUES(...) with only the first tuple kept
/// - Block comments dropped, /*! hints */ kept with their literals replaced
/// - Whitespace runs (newlines included) → single space
///
/// Bytes outside literals are copied as-is, so the result keeps the
/// statement's original case. Non-UTF-8 bytes are replaced lossily.
pub fn fingerprint(sql: &[u8], charset: Charset) -> String {
    let built = build(sql, charset);
    String::from_utf8_lossy(&built).into_owned()
}

fn build(sql: &[u8], charset: Charset) -> Vec<u8> {
    let start = sql.iter().take_while(|b| b.is_ascii_whitespace()).count();
    let sql = &sql[start..];
    let len = sql.len() - trailing_whitespace(sql);
    let sql = &sql[..len];
    let mut result = Vec::with_capacity(len + 8);
    let mut i = 0;

    while i < len {
        let b = sql[i];
        match b {
            b'\'' | b'"' => {
                i += scan::literal_end(&sql[i..], charset);
                result.extend_from_slice(b"'s'");
            }
            // Quoted identifiers are structure, not data.
            b'`' => {
                let end = i + scan::quote_end(&sql[i..], charset);
                result.extend_from_slice(&sql[i..end]);
                i = end;
            }
            b'0'..=b'9' | b'.' => {
                let end = i + scan::number_end(&sql[i..]);
                push_number(&sql[i..end], &mut result);
                i = end;
            }
            b'I' | b'i' | b'V' | b'v' => match lists::collapse(sql, i, charset, &mut result) {
                Some(end) => i = end,
                None => {
                    result.push(b);
                    i += 1;
                }
            },
            b'/' => match scan::comment(&sql[i..]) {
                // Only the marker is emitted; the body goes through the
                // normal dispatch so its literals are erased too.
                Some(Comment::Hint) => {
                    result.extend_from_slice(b"/*!");
                    i += 3;
                }
                Some(Comment::Block { len }) => i += len,
                None => {
                    result.push(b);
                    i += 1;
                }
            },
            _ if b.is_ascii_whitespace() => {
                if result.last().is_some_and(|&c| c != b' ') {
                    result.push(b' ');
                }
                i += 1;
            }
            _ => {
                result.push(b);
                i += 1;
            }
        }
    }

    if contains(&result, b"/*!") {
        result = compress_hints(&result);
    }
    let trimmed = result.len() - trailing_whitespace(&result);
    result.truncate(trimmed);
    result
}

/// Emit the placeholder for a scanned numeric fragment.
///
/// `12.` keeps its trailing dot as `1.`, a lone `.` (e.g. `t.col`) stays a
/// dot, everything else becomes `1`.
pub(crate) fn push_number(fragment: &[u8], out: &mut Vec<u8>) {
    match fragment {
        [.., d, b'.'] if d.is_ascii_digit() => out.extend_from_slice(b"1."),
        [.., b'.'] => out.push(b'.'),
        _ => out.push(b'1'),
    }
}

/// Second pass over a built fingerprint containing `/*!` hints.
///
/// Drops the version tag (already a `1` placeholder after the first pass)
/// following each `/*!` marker and collapses whitespace
/// inside hints and at their edges. Text outside hints passes through.
fn compress_hints(src: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(src.len());
    let mut in_hint = false;
    let mut i = 0;

    while i < src.len() {
        if !in_hint && src[i..].starts_with(b"/*!") {
            result.extend_from_slice(b"/*!");
            i += 3;
            let version = src[i..].iter().take_while(|b| b.is_ascii_digit()).count();
            if version > 0 {
                trace!("dropping hint version tag {}", String::from_utf8_lossy(&src[i..i + version]));
            }
            i += version;
            in_hint = true;
            continue;
        }
        if in_hint && src[i..].starts_with(b"*/") {
            result.extend_from_slice(b"*/");
            i += 2;
            in_hint = false;
            continue;
        }

        let b = src[i];
        let is_space = b == b' ' || (in_hint && b.is_ascii_whitespace());
        if is_space {
            if result.last().is_some_and(|&c| c != b' ') {
                result.push(b' ');
            }
        } else {
            result.push(b);
        }
        i += 1;
    }

    result
}

fn trailing_whitespace(text: &[u8]) -> usize {
    text.iter().rev().take_while(|b| b.is_ascii_whitespace()).count()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
