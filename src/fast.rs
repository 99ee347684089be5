//! Regex-driven approximate normalizer.
//!
//! Much cheaper than the byte scanner, but it does not understand charsets,
//! nested brackets or comments, and it also rewrites digits that are part of
//! identifiers. Only the first two groups of a repeated `IN`/`VALUES` list
//! are merged.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::bytes::{NoExpand, Regex};

static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s-u)'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*""#).expect("quoted literal pattern")
});

static SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)\s{2,}").expect("space pattern"));

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u)[+-]?(?:\d+(?:\.\d+)?|\.\d+)(?:[Ee]\d+)?").expect("number pattern")
});

static IN_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i-u)\bin\s*\([^),]*\)\s*,\s*\([^),]*\)").expect("in-list pattern")
});

static VALUES_LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i-u)\bvalues\s*\([^)]*\)\s*,\s*\([^)]*\)").expect("values-list pattern")
});

/// Force compilation of every pattern so the first call does not pay for it.
pub fn warm_up() {
    for re in [&QUOTED_RE, &SPACE_RE, &NUMBER_RE, &IN_LIST_RE, &VALUES_LIST_RE] {
        LazyLock::force(re);
    }
}

/// Approximate fingerprint of `sql`. Non-UTF-8 bytes are replaced lossily.
pub fn fingerprint(sql: &[u8]) -> String {
    let sql = QUOTED_RE.replace_all(sql, NoExpand(b"'s'"));
    let sql = rewrite(sql, &SPACE_RE, b" ");
    let sql = rewrite(sql, &NUMBER_RE, b"1");
    let sql = rewrite(sql, &IN_LIST_RE, b"in (1)");
    let sql = rewrite(sql, &VALUES_LIST_RE, b"values (1)");
    String::from_utf8_lossy(&sql).into_owned()
}

fn rewrite<'a>(text: Cow<'a, [u8]>, re: &Regex, with: &[u8]) -> Cow<'a, [u8]> {
    let replaced = match re.replace_all(&text, NoExpand(with)) {
        Cow::Borrowed(_) => None,
        Cow::Owned(replaced) => Some(replaced),
    };
    replaced.map_or(text, Cow::Owned)
}
