use bson::Bson;
use serde::{Deserialize, Serialize};

/// Field used for ordering when the caller gives no sort.
pub const DEFAULT_SORT_FIELD: &str = "created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Desc }
    }
}

/// Options for `find`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOptions {
    pub sort: Option<Vec<SortSpec>>,
    /// `Some(0)` is treated the same as `None`.
    pub limit: Option<usize>,
}

impl FindOptions {
    /// The sort actually applied: the caller's, or `created_at` descending.
    #[must_use]
    pub fn effective_sort(&self) -> Vec<SortSpec> {
        match &self.sort {
            Some(s) => s.clone(),
            None => vec![SortSpec::desc(DEFAULT_SORT_FIELD)],
        }
    }

    #[must_use]
    pub fn effective_limit(&self) -> Option<usize> {
        self.limit.filter(|n| *n > 0)
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, sort: Vec<SortSpec>) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// One branch of an `$or` clause: a single-field equality.
#[derive(Debug, Clone, PartialEq)]
pub struct OrBranch {
    pub field: String,
    pub value: Bson,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals { field: String, value: Bson },
    In { field: String, values: Vec<Bson> },
    NotEquals { field: String, value: Bson },
    Exists { field: String, present: bool },
    /// `options` holds the raw `$options` flags (`i`, `m`, `s`, `x`).
    MatchesPattern { field: String, pattern: String, options: String },
    Or(Vec<OrBranch>),
}

impl Predicate {
    /// The field this predicate constrains; `None` for `Or`, which spans fields.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Equals { field, .. }
            | Self::In { field, .. }
            | Self::NotEquals { field, .. }
            | Self::Exists { field, .. }
            | Self::MatchesPattern { field, .. } => Some(field),
            Self::Or(_) => None,
        }
    }
}

/// Conjunction of predicates parsed from one filter document. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub predicates: Vec<Predicate>,
}

impl Filter {
    #[must_use]
    pub const fn all() -> Self {
        Self { predicates: Vec::new() }
    }

    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.predicates.is_empty()
    }

    #[must_use]
    pub fn has_or(&self) -> bool {
        self.predicates.iter().any(|p| matches!(p, Predicate::Or(_)))
    }
}

impl From<Vec<Predicate>> for Filter {
    fn from(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }
}

/// Null, undefined and empty string are interchangeable targets in `$or` branches.
#[must_use]
pub fn is_null_equivalent(v: Option<&Bson>) -> bool {
    match v {
        None | Some(Bson::Null | Bson::Undefined) => true,
        Some(Bson::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Null or undefined (SQL NULL); empty string is a value here.
#[must_use]
pub fn is_null(v: Option<&Bson>) -> bool {
    matches!(v, None | Some(Bson::Null | Bson::Undefined))
}

/// `$regex` flags that request case-insensitive matching.
#[must_use]
pub fn options_case_insensitive(options: &str) -> bool {
    options.contains('i')
}
