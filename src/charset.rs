use std::fmt;

/// Character set the client declared for a statement.
///
/// Only affects where quoted literals end: multi-byte encodings can carry
/// a trail byte equal to a quote or backslash, which must not be treated
/// as a delimiter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Charset {
    Latin1,
    Utf8,
    Gbk,
    /// Nothing declared. UTF-8 is detected from the first 3-byte sequence,
    /// otherwise high bytes are treated as GBK pairs.
    #[default]
    Unspecified,
}

impl Charset {
    /// Map a MySQL charset name to a scanning mode. Unknown names fall back
    /// to [`Charset::Unspecified`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "latin1" => Charset::Latin1,
            "utf8" | "utf-8" | "utf8mb3" | "utf8mb4" => Charset::Utf8,
            "gbk" => Charset::Gbk,
            _ => Charset::Unspecified,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Charset::Latin1 => "latin1",
            Charset::Utf8 => "utf8",
            Charset::Gbk => "gbk",
            Charset::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
