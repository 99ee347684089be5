use std::fmt;

use serde::{Serialize, Serializer};

/// Coarse statement type, named after the MySQL `SQLCOM_*` commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatementType {
    ShowProcesslist,
    ShowSlaveStatus,
    ShowMasterStatus,
    ShowInnodbStatus,
    ShowStatus,
    InsertSelect,
    Select,
    Insert,
    Replace,
    Update,
    Delete,
    ChangeDb,
    Show,
    Create,
    Alter,
    Truncate,
    Drop,
    SetOption,
    Commit,
    Rollback,
    Load,
    Revoke,
    Other,
}

impl StatementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::ShowProcesslist => "SQLCOM_SHOW_PROCESSLIST",
            StatementType::ShowSlaveStatus => "SQLCOM_SHOW_SLAVE_STATUS",
            StatementType::ShowMasterStatus => "SQLCOM_SHOW_MASTER_STATUS",
            StatementType::ShowInnodbStatus => "SQLCOM_SHOW_INNODB_STATUS",
            StatementType::ShowStatus => "SQLCOM_SHOW_STATUS",
            StatementType::InsertSelect => "SQLCOM_INSERT_SELECT",
            StatementType::Select => "SQLCOM_SELECT",
            StatementType::Insert => "SQLCOM_INSERT",
            StatementType::Replace => "SQLCOM_REPLACE",
            StatementType::Update => "SQLCOM_UPDATE",
            StatementType::Delete => "SQLCOM_DELETE",
            StatementType::ChangeDb => "SQLCOM_CHANGE_DB",
            StatementType::Show => "SQLCOM_SHOW",
            StatementType::Create => "SQLCOM_CREATE",
            StatementType::Alter => "SQLCOM_ALTER",
            StatementType::Truncate => "SQLCOM_TRUNCATE",
            StatementType::Drop => "SQLCOM_DROP",
            StatementType::SetOption => "SQLCOM_SET_OPTION",
            StatementType::Commit => "SQLCOM_COMMIT",
            StatementType::Rollback => "SQLCOM_ROLLBACK",
            StatementType::Load => "SQLCOM_LOAD",
            StatementType::Revoke => "SQLCOM_REVOKE",
            StatementType::Other => "SQLCOM_OTHER",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for StatementType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One row of the classification table.
#[derive(Clone, Copy, Debug)]
pub struct ClassificationRule {
    pub keywords: &'static [&'static str],
    pub tag: StatementType,
}

impl ClassificationRule {
    const fn new(keywords: &'static [&'static str], tag: StatementType) -> Self {
        Self { keywords, tag }
    }

    /// `upper` must already be upper-cased.
    ///
    /// A single keyword must be a prefix. Several keywords must each appear
    /// after the end of the previous one, with anything in between.
    pub fn matches(&self, upper: &str) -> bool {
        match self.keywords {
            [] => false,
            [keyword] => upper.starts_with(keyword),
            keywords => {
                let mut pos = 0;
                for keyword in keywords {
                    match upper[pos..].find(keyword) {
                        Some(at) => pos += at + keyword.len(),
                        None => return false,
                    }
                }
                true
            }
        }
    }
}

/// MySQL statement types, most specific first.
const MYSQL_RULES: &[ClassificationRule] = &[
    ClassificationRule::new(&["SHOW", "PROCESSLIST"], StatementType::ShowProcesslist),
    ClassificationRule::new(&["SHOW", "SLAVE", "STAT"], StatementType::ShowSlaveStatus),
    ClassificationRule::new(&["SHOW", "MASTER", "STAT"], StatementType::ShowMasterStatus),
    ClassificationRule::new(&["SHOW", "INNODB", "STAT"], StatementType::ShowInnodbStatus),
    ClassificationRule::new(&["SHOW", "STAT"], StatementType::ShowStatus),
    ClassificationRule::new(&["INSERT", "SELECT"], StatementType::InsertSelect),
    ClassificationRule::new(&["SELECT"], StatementType::Select),
    ClassificationRule::new(&["INSERT"], StatementType::Insert),
    ClassificationRule::new(&["REPLACE"], StatementType::Replace),
    ClassificationRule::new(&["UPDATE"], StatementType::Update),
    ClassificationRule::new(&["DELETE"], StatementType::Delete),
    ClassificationRule::new(&["USE"], StatementType::ChangeDb),
    ClassificationRule::new(&["SHOW"], StatementType::Show),
    ClassificationRule::new(&["CREATE"], StatementType::Create),
    ClassificationRule::new(&["ALTER"], StatementType::Alter),
    ClassificationRule::new(&["TRUNCATE"], StatementType::Truncate),
    ClassificationRule::new(&["DROP"], StatementType::Drop),
    ClassificationRule::new(&["SET"], StatementType::SetOption),
    ClassificationRule::new(&["BEGIN"], StatementType::Commit),
    ClassificationRule::new(&["COMMIT"], StatementType::Commit),
    ClassificationRule::new(&["ROLLBACK"], StatementType::Rollback),
    ClassificationRule::new(&["LOAD"], StatementType::Load),
    ClassificationRule::new(&["REVOKE"], StatementType::Revoke),
];

/// Ordered rule table. Built once and shared read-only between normalizers.
#[derive(Clone, Debug)]
pub struct Classifier {
    rules: Vec<ClassificationRule>,
}

impl Classifier {
    pub fn mysql() -> Self {
        Self {
            rules: MYSQL_RULES.to_vec(),
        }
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// Classify an already upper-cased fingerprint.
    pub fn classify_upper(&self, upper: &str) -> StatementType {
        self.rules
            .iter()
            .find(|rule| rule.matches(upper))
            .map(|rule| rule.tag)
            .unwrap_or(StatementType::Other)
    }

    pub fn classify(&self, fingerprint: &str) -> StatementType {
        self.classify_upper(&fingerprint.to_uppercase())
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::mysql()
    }
}
