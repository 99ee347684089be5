//! `IN (...)` and `VALUES (...)` list collapsing.
//!
//! A list of plain literals after `IN` collapses to `IN(1) ` or `IN('s') `.
//! Anything else keeps its first parenthesized group, with literals replaced,
//! and drops every comma-separated group that follows it. A group made of
//! row tuples, as in `(a,b) IN ((1,2),(3,4))`, keeps only its first tuple.

use tracing::trace;

use crate::charset::Charset;
use crate::fingerprint::push_number;
use crate::scan::{self, Comment};

/// Literal shape of a homogeneous `IN` list, taken from its first element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListShape {
    Strings,
    Ints,
}

impl ListShape {
    fn placeholder(&self) -> &'static [u8] {
        match self {
            ListShape::Strings => b"IN('s') ",
            ListShape::Ints => b"IN(1) ",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Keyword {
    In,
    Values,
}

impl Keyword {
    fn text(&self) -> &'static [u8] {
        match self {
            Keyword::In => b"IN",
            Keyword::Values => b"VALUES",
        }
    }
}

/// Try to collapse a list whose keyword starts at `pos`.
///
/// Returns the cursor after everything consumed, or `None` when `pos` does
/// not start a standalone `IN`/`VALUES` followed by `(`. Output is appended
/// to `out`.
pub(crate) fn collapse(sql: &[u8], pos: usize, charset: Charset, out: &mut Vec<u8>) -> Option<usize> {
    let (keyword, open) = list_start(sql, pos)?;

    if keyword == Keyword::In {
        if let Some((shape, end)) = simple_shape(sql, open, charset) {
            out.extend_from_slice(shape.placeholder());
            return Some(skip_repeats(sql, end, charset));
        }
    }

    out.extend_from_slice(keyword.text());
    let first_end = match first_row(sql, open, charset) {
        Some((row, end)) => {
            out.extend_from_slice(&row);
            end
        }
        None => copy_group(sql, open, charset, out),
    };
    let end = skip_repeats(sql, first_end, charset);
    if end > first_end {
        out.push(b' ');
    }
    Some(end)
}

/// Keyword at `pos` and the offset of the `(` that opens its list.
fn list_start(sql: &[u8], pos: usize) -> Option<(Keyword, usize)> {
    if pos == 0 || !sql[pos - 1].is_ascii_whitespace() {
        return None;
    }
    let keyword = match sql[pos] {
        b'I' | b'i' => Keyword::In,
        b'V' | b'v' => Keyword::Values,
        _ => return None,
    };
    let text = keyword.text();
    let after = pos + text.len();
    if !sql.get(pos..after)?.eq_ignore_ascii_case(text) {
        return None;
    }
    if sql.get(after).is_some_and(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    let open = after + skip_whitespace(&sql[after..]);
    (sql.get(open) == Some(&b'(')).then_some((keyword, open))
}

/// Shape of the group at `open` when it holds nothing but literals, and the
/// offset just past its `)`.
fn simple_shape(sql: &[u8], open: usize, charset: Charset) -> Option<(ListShape, usize)> {
    let mut shape = None;
    let mut i = open + 1;
    loop {
        i += skip_whitespace(&sql[i..]);
        let b = *sql.get(i)?;
        let element_shape = match b {
            b'\'' | b'"' => {
                i += scan::literal_end(&sql[i..], charset);
                ListShape::Strings
            }
            b'-' if sql.get(i + 1).is_some_and(|n| n.is_ascii_digit()) => {
                i += 1 + scan::number_end(&sql[i + 1..]);
                ListShape::Ints
            }
            b'0'..=b'9' | b'.' => {
                i += scan::number_end(&sql[i..]);
                ListShape::Ints
            }
            _ => return None,
        };
        shape.get_or_insert(element_shape);

        i += skip_whitespace(&sql[i..]);
        match sql.get(i)? {
            b',' => i += 1,
            b')' => return shape.map(|s| (s, i + 1)),
            _ => return None,
        }
    }
}

/// Row-constructor list `((1,2),(3,4))`: the outer group rendered with only
/// its first inner tuple, and the offset past the outer `)`. `None` when the
/// group does not consist solely of comma-separated tuples.
fn first_row(sql: &[u8], open: usize, charset: Charset) -> Option<(Vec<u8>, usize)> {
    let inner = open + 1 + skip_whitespace(&sql[open + 1..]);
    if sql.get(inner) != Some(&b'(') {
        return None;
    }
    let mut row = vec![b'('];
    let first_end = copy_group(sql, inner, charset, &mut row);
    let rest = skip_repeats(sql, first_end, charset);
    let close = rest + skip_whitespace(&sql[rest..]);
    if sql.get(close) != Some(&b')') {
        return None;
    }
    row.push(b')');
    Some((row, close + 1))
}

/// Copy the group at `open` with literals replaced, returning the offset
/// just past its closing `)`.
fn copy_group(sql: &[u8], open: usize, charset: Charset, out: &mut Vec<u8>) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < sql.len() {
        let b = sql[i];
        match b {
            b'\'' | b'"' => {
                i += scan::literal_end(&sql[i..], charset);
                out.extend_from_slice(b"'s'");
            }
            b'`' => {
                let len = scan::quote_end(&sql[i..], charset);
                out.extend_from_slice(&sql[i..i + len]);
                i += len;
            }
            b'0'..=b'9' | b'.' => {
                let len = scan::number_end(&sql[i..]);
                push_number(&sql[i..i + len], out);
                i += len;
            }
            b'/' => match scan::comment(&sql[i..]) {
                Some(Comment::Block { len }) => i += len,
                Some(Comment::Hint) => {
                    out.extend_from_slice(b"/*!");
                    i += 3;
                }
                None => {
                    out.push(b);
                    i += 1;
                }
            },
            _ if b.is_ascii_whitespace() => {
                i += skip_whitespace(&sql[i..]);
                let prev_tight = matches!(out.last(), Some(b'(' | b',' | b' '));
                let next_tight = matches!(sql.get(i), Some(b')' | b',') | None);
                if !prev_tight && !next_tight {
                    out.push(b' ');
                }
            }
            b'(' => {
                depth += 1;
                out.push(b);
                i += 1;
            }
            b')' => {
                out.push(b);
                i += 1;
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i;
                }
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }
    trace!("unterminated list group at offset {open}");
    sql.len()
}

/// Skip every further `, (...)` group after `pos`. Returns `pos` unchanged
/// when no repeated group follows.
fn skip_repeats(sql: &[u8], pos: usize, charset: Charset) -> usize {
    let mut end = pos;
    loop {
        let sep = sql[end..]
            .iter()
            .take_while(|b| **b == b',' || b.is_ascii_whitespace())
            .count();
        let next = end + sep;
        if sql.get(next) != Some(&b'(') || !sql[end..next].contains(&b',') {
            return end;
        }
        end = group_end(sql, next, charset);
    }
}

/// Offset just past the `)` matching the `(` at `open`, quotes respected.
fn group_end(sql: &[u8], open: usize, charset: Charset) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < sql.len() {
        match sql[i] {
            b if scan::is_quote(b) => {
                i += scan::quote_end(&sql[i..], charset);
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    sql.len()
}

fn skip_whitespace(text: &[u8]) -> usize {
    text.iter().take_while(|b| b.is_ascii_whitespace()).count()
}
