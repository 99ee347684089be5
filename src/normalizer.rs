use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::charset::Charset;
use crate::classify::Classifier;
use crate::fast;
use crate::fingerprint::{self, FingerPrint};

/// Which normalizer a caller wants: the byte scanner or the regex fast path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    #[default]
    Precise,
    Fast,
}

impl Strategy {
    /// Build a normalizer for this strategy. `charset` is ignored by the
    /// fast path.
    pub fn build(self, charset: Charset, classifier: Arc<Classifier>) -> Box<dyn Normalizer> {
        debug!("building {self} normalizer (charset {charset})");
        match self {
            Strategy::Precise => Box::new(PreciseNormalizer::new(charset, classifier)),
            Strategy::Fast => Box::new(FastNormalizer::new(classifier)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Precise => write!(f, "precise"),
            Strategy::Fast => write!(f, "fast"),
        }
    }
}

/// Turns raw SQL into a [`FingerPrint`]. Implementations hold only
/// immutable state and can be shared between threads.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, sql: &[u8]) -> FingerPrint;

    fn strategy(&self) -> Strategy;
}

/// Single-pass byte scanner aware of the client charset.
#[derive(Clone, Debug)]
pub struct PreciseNormalizer {
    charset: Charset,
    classifier: Arc<Classifier>,
}

impl PreciseNormalizer {
    pub fn new(charset: Charset, classifier: Arc<Classifier>) -> Self {
        Self {
            charset,
            classifier,
        }
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }
}

impl Normalizer for PreciseNormalizer {
    fn normalize(&self, sql: &[u8]) -> FingerPrint {
        let text = fingerprint::fingerprint(sql, self.charset);
        FingerPrint::classified(text, &self.classifier)
    }

    fn strategy(&self) -> Strategy {
        Strategy::Precise
    }
}

/// Regex fast path. See [`crate::fast`] for what it gets wrong.
#[derive(Clone, Debug)]
pub struct FastNormalizer {
    classifier: Arc<Classifier>,
}

impl FastNormalizer {
    pub fn new(classifier: Arc<Classifier>) -> Self {
        fast::warm_up();
        Self { classifier }
    }
}

impl Normalizer for FastNormalizer {
    fn normalize(&self, sql: &[u8]) -> FingerPrint {
        let text = fast::fingerprint(sql);
        FingerPrint::classified(text, &self.classifier)
    }

    fn strategy(&self) -> Strategy {
        Strategy::Fast
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::StatementType;

    fn classifier() -> Arc<Classifier> {
        Arc::new(Classifier::mysql())
    }

    #[test]
    fn test_strategies_agree_on_simple_statement() {
        let sql = b"select * from t where id=123 and name='bob'";
        let precise = Strategy::Precise.build(Charset::Utf8, classifier());
        let fast = Strategy::Fast.build(Charset::Utf8, classifier());

        assert_eq!(precise.strategy(), Strategy::Precise);
        assert_eq!(fast.strategy(), Strategy::Fast);
        assert_eq!(precise.normalize(sql), fast.normalize(sql));
        assert_eq!(precise.normalize(sql).statement_type, StatementType::Select);
    }

    #[test]
    fn test_strategies_differ_on_nested_lists() {
        let sql = b"INSERT INTO t VALUES (now(), 1), (now(), 2)";
        let precise = PreciseNormalizer::new(Charset::Utf8, classifier()).normalize(sql);
        let fast = FastNormalizer::new(classifier()).normalize(sql);

        assert_eq!(precise.fingerprint, "INSERT INTO t VALUES(now(),1)");
        assert_ne!(precise.fingerprint, fast.fingerprint);
        assert_eq!(precise.statement_type, StatementType::Insert);
        assert_eq!(fast.statement_type, StatementType::Insert);
    }

    #[test]
    fn test_precise_keeps_charset() {
        let normalizer = PreciseNormalizer::new(Charset::Gbk, classifier());
        assert_eq!(normalizer.charset(), Charset::Gbk);
        let fp = normalizer.normalize(b"UPDATE t SET a = '\x95\x5c' WHERE id = 7");
        assert_eq!(fp.fingerprint, "UPDATE t SET a = 's' WHERE id = 1");
        assert_eq!(fp.statement_type, StatementType::Update);
    }

    #[test]
    fn test_shared_across_threads() {
        let normalizer: Arc<dyn Normalizer> =
            Arc::new(PreciseNormalizer::new(Charset::Latin1, classifier()));
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let normalizer = Arc::clone(&normalizer);
                std::thread::spawn(move || {
                    let sql = format!("SELECT * FROM t WHERE id = {n}");
                    normalizer.normalize(sql.as_bytes())
                })
            })
            .collect();

        for handle in handles {
            let fp = handle.join().unwrap();
            assert_eq!(fp.fingerprint, "SELECT * FROM t WHERE id = 1");
        }
    }
}
