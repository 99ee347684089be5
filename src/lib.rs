//! SQL statement fingerprinting.
//!
//! Turns raw MySQL statements into a normalized fingerprint, with literals,
//! value lists, whitespace and comments collapsed, plus a coarse statement
//! type. Two statements with the same structure but different literal values
//! share a fingerprint, so callers can group, dedupe or rate-limit on it.
//!
//! ```
//! use sqlfinger::{generate_fingerprint, Charset, StatementType};
//!
//! let fp = generate_fingerprint("select * from t where id=123 and name='bob'", Charset::Utf8);
//! assert_eq!(fp.fingerprint, "select * from t where id=1 and name='s'");
//! assert_eq!(fp.statement_type, StatementType::Select);
//! ```

pub mod charset;
pub mod classify;
pub mod fast;
pub mod fingerprint;
mod lists;
pub mod normalizer;
pub mod scan;

use std::sync::LazyLock;

pub use charset::Charset;
pub use classify::{ClassificationRule, Classifier, StatementType};
pub use fingerprint::FingerPrint;
pub use normalizer::{FastNormalizer, Normalizer, PreciseNormalizer, Strategy};

static DEFAULT_CLASSIFIER: LazyLock<Classifier> = LazyLock::new(Classifier::mysql);

/// Fingerprint `sql` with the charset-aware scanner.
pub fn generate_fingerprint(sql: impl AsRef<[u8]>, charset: Charset) -> FingerPrint {
    let text = fingerprint::fingerprint(sql.as_ref(), charset);
    FingerPrint::classified(text, &DEFAULT_CLASSIFIER)
}

/// Fingerprint `sql` with the regex fast path.
pub fn generate_fingerprint_fast(sql: impl AsRef<[u8]>) -> FingerPrint {
    let text = fast::fingerprint(sql.as_ref());
    FingerPrint::classified(text, &DEFAULT_CLASSIFIER)
}

/// Statement type of an already normalized fingerprint.
pub fn classify(fingerprint_text: &str) -> StatementType {
    DEFAULT_CLASSIFIER.classify(fingerprint_text)
}
