use crate::errors::DbError;
use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use super::types::{Filter, FindOptions, OrBranch, Order, Predicate, SortSpec};

const OR_KEY: &str = "$or";
const REGEX_KEY: &str = "$regex";
const OPTIONS_KEY: &str = "$options";
const IN_KEY: &str = "$in";
const NE_KEY: &str = "$ne";
const EXISTS_KEY: &str = "$exists";

/// Flags used when `$regex` arrives without `$options` (or with an empty one).
pub const DEFAULT_REGEX_OPTIONS: &str = "i";

/// Parse a filter document into a conjunction of predicates.
///
/// Field values are read as follows:
/// - array: `In`
/// - sub-document with a recognized operator: that operator, checked in the order
///   `$regex`, `$in`, `$ne`, `$exists` (the first hit wins, other keys are ignored)
/// - sub-document without one: equality against the whole sub-document. Unknown
///   operators such as `$gt` land here and never raise.
/// - anything else: equality
///
/// # Errors
/// Returns `MalformedFilter` when `$or` is not an array of non-empty documents, or an
/// operator operand has the wrong shape.
pub fn parse_filter(doc: &Document) -> Result<Filter, DbError> {
    let mut predicates = Vec::with_capacity(doc.len());
    for (key, value) in doc {
        if key == OR_KEY {
            predicates.push(parse_or(value)?);
        } else {
            predicates.push(parse_field(key, value)?);
        }
    }
    Ok(Filter { predicates })
}

/// # Errors
/// Returns an error if the JSON is not an object or the filter is malformed.
pub fn parse_filter_json(json: &str) -> Result<Filter, DbError> {
    let doc = crate::utils::json::parse_json_to_document(json)?;
    parse_filter(&doc)
}

fn parse_or(value: &Bson) -> Result<Predicate, DbError> {
    let Bson::Array(items) = value else {
        return Err(DbError::MalformedFilter(format!("$or expects an array, got {value}")));
    };
    let mut branches = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let Bson::Document(cond) = item else {
            return Err(DbError::MalformedFilter(format!("$or[{i}] is not a document")));
        };
        // Only the first key of each branch is read; extra keys are ignored.
        let Some((field, target)) = cond.iter().next() else {
            return Err(DbError::MalformedFilter(format!("$or[{i}] is empty")));
        };
        if cond.len() > 1 {
            log::debug!("$or[{i}] has {} keys; only `{field}` is used", cond.len());
        }
        branches.push(OrBranch { field: field.clone(), value: target.clone() });
    }
    Ok(Predicate::Or(branches))
}

fn parse_field(field: &str, value: &Bson) -> Result<Predicate, DbError> {
    let field = field.to_string();
    match value {
        Bson::Array(values) => Ok(Predicate::In { field, values: values.clone() }),
        Bson::RegularExpression(re) => Ok(Predicate::MatchesPattern {
            field,
            pattern: re.pattern.as_str().to_string(),
            options: regex_options(Some(re.options.as_str())),
        }),
        Bson::Document(sub) => parse_operator(field, sub),
        other => Ok(Predicate::Equals { field, value: other.clone() }),
    }
}

fn parse_operator(field: String, sub: &Document) -> Result<Predicate, DbError> {
    if let Some(pattern) = sub.get(REGEX_KEY) {
        let options = match sub.get(OPTIONS_KEY) {
            None => None,
            Some(Bson::String(s)) => Some(s.as_str()),
            Some(other) => {
                return Err(DbError::MalformedFilter(format!(
                    "{OPTIONS_KEY} on `{field}` must be a string, got {other}"
                )));
            }
        };
        return match pattern {
            Bson::String(p) => {
                Ok(Predicate::MatchesPattern { field, pattern: p.clone(), options: regex_options(options) })
            }
            Bson::RegularExpression(re) => Ok(Predicate::MatchesPattern {
                field,
                pattern: re.pattern.as_str().to_string(),
                options: regex_options(options.or(Some(re.options.as_str()))),
            }),
            other => Err(DbError::MalformedFilter(format!(
                "{REGEX_KEY} on `{field}` must be a string, got {other}"
            ))),
        };
    }
    if let Some(set) = sub.get(IN_KEY) {
        return match set {
            Bson::Array(values) => Ok(Predicate::In { field, values: values.clone() }),
            other => Err(DbError::MalformedFilter(format!(
                "{IN_KEY} on `{field}` must be an array, got {other}"
            ))),
        };
    }
    if let Some(v) = sub.get(NE_KEY) {
        return Ok(Predicate::NotEquals { field, value: v.clone() });
    }
    if let Some(v) = sub.get(EXISTS_KEY) {
        // Only a literal `false` means "absent".
        let present = !matches!(v, Bson::Boolean(false));
        return Ok(Predicate::Exists { field, present });
    }
    // Unrecognized shape: legacy pass-through equality on the whole sub-document.
    Ok(Predicate::Equals { field, value: Bson::Document(sub.clone()) })
}

fn regex_options(raw: Option<&str>) -> String {
    match raw {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => DEFAULT_REGEX_OPTIONS.to_string(),
    }
}

/// Parse a sort document such as `{ "created_at": -1, "name": "asc" }`.
/// `-1`, `"desc"` and `"descending"` sort descending; any other value ascends.
#[must_use]
pub fn parse_sort(doc: &Document) -> Vec<SortSpec> {
    doc.iter()
        .map(|(field, dir)| SortSpec { field: field.clone(), order: parse_direction(dir) })
        .collect()
}

/// # Errors
/// Returns an error if the JSON is not an object.
pub fn parse_sort_json(json: &str) -> Result<Vec<SortSpec>, DbError> {
    let doc = crate::utils::json::parse_json_to_document(json)?;
    Ok(parse_sort(&doc))
}

fn parse_direction(dir: &Bson) -> Order {
    let desc = match dir {
        Bson::Int32(i) => *i == -1,
        Bson::Int64(i) => *i == -1,
        Bson::Double(f) => (*f + 1.0).abs() < f64::EPSILON,
        Bson::String(s) => matches!(s.to_ascii_lowercase().as_str(), "desc" | "descending"),
        _ => false,
    };
    if desc { Order::Desc } else { Order::Asc }
}

// Serde-facing shape of `{ "sort": {...}, "limit": N }`
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct FindOptionsSerde {
    #[serde(default)]
    pub sort: Option<Document>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl From<FindOptionsSerde> for FindOptions {
    fn from(fs: FindOptionsSerde) -> Self {
        Self { sort: fs.sort.as_ref().map(parse_sort), limit: fs.limit }
    }
}

/// # Errors
/// Returns an error if the JSON cannot be parsed into find options.
pub fn parse_find_options_json(json: &str) -> Result<FindOptions, DbError> {
    let fs: FindOptionsSerde = serde_json::from_str(json)?;
    Ok(fs.into())
}
