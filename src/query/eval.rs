//! Fallback path: evaluate a predicate conjunction against records in memory.
//!
//! The per-predicate semantics here are the same ones `MemoryStore` applies to native
//! constraints, so a filter that could have gone either way selects the same rows.

use crate::errors::DbError;
use bson::{Bson, Document};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

use super::types::{Filter, OrBranch, Predicate, is_null, is_null_equivalent};

enum CompiledPredicate<'a> {
    Plain(&'a Predicate),
    Pattern { field: &'a str, re: Regex },
}

/// A filter with its regexes built once, ready to run over a whole table.
pub struct CompiledFilter<'a> {
    predicates: Vec<CompiledPredicate<'a>>,
}

impl<'a> CompiledFilter<'a> {
    /// # Errors
    /// Returns `MalformedFilter` when a `$regex` pattern does not compile.
    pub fn new(filter: &'a Filter) -> Result<Self, DbError> {
        let mut predicates = Vec::with_capacity(filter.predicates.len());
        for p in &filter.predicates {
            predicates.push(match p {
                Predicate::MatchesPattern { field, pattern, options } => CompiledPredicate::Pattern {
                    field,
                    re: build_regex(pattern, options)
                        .map_err(|e| DbError::MalformedFilter(format!("$regex on `{field}`: {e}")))?,
                },
                other => CompiledPredicate::Plain(other),
            });
        }
        Ok(Self { predicates })
    }

    /// True when `doc` satisfies every predicate, the `Or` clause included.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.predicates.iter().all(|p| match p {
            CompiledPredicate::Plain(p) => eval_predicate(doc, p),
            CompiledPredicate::Pattern { field, re } => {
                matches!(doc.get(*field), Some(Bson::String(s)) if re.is_match(s))
            }
        })
    }

    /// Keep the matching records, preserving input order.
    #[must_use]
    pub fn apply(&self, records: Vec<Document>) -> Vec<Document> {
        records.into_iter().filter(|d| self.matches(d)).collect()
    }
}

/// Build a regex from a literal pattern and Mongo-style flags. Unknown flags are ignored.
///
/// # Errors
/// Returns the regex compile error.
pub fn build_regex(pattern: &str, options: &str) -> Result<Regex, regex::Error> {
    let mut b = RegexBuilder::new(pattern);
    for flag in options.chars() {
        match flag {
            'i' => {
                b.case_insensitive(true);
            }
            'm' => {
                b.multi_line(true);
            }
            's' => {
                b.dot_matches_new_line(true);
            }
            'x' => {
                b.ignore_whitespace(true);
            }
            _ => {}
        }
    }
    b.build()
}

/// One-shot evaluation. A pattern that fails to compile matches nothing.
#[must_use]
pub fn eval_filter(doc: &Document, filter: &Filter) -> bool {
    filter.predicates.iter().all(|p| eval_predicate(doc, p))
}

fn eval_predicate(doc: &Document, p: &Predicate) -> bool {
    match p {
        Predicate::Equals { field, value } => field_equals(doc.get(field), value),
        Predicate::In { field, values } => field_in(doc.get(field), values),
        Predicate::NotEquals { field, value } => field_not_equals(doc.get(field), value),
        Predicate::Exists { field, present } => is_null(doc.get(field)) != *present,
        Predicate::MatchesPattern { field, pattern, options } => match doc.get(field) {
            Some(Bson::String(s)) => build_regex(pattern, options).is_ok_and(|re| re.is_match(s)),
            _ => false,
        },
        Predicate::Or(branches) => branches.iter().any(|b| eval_or_branch(doc, b)),
    }
}

fn eval_or_branch(doc: &Document, b: &OrBranch) -> bool {
    if is_null_equivalent(Some(&b.value)) {
        return is_null_equivalent(doc.get(&b.field));
    }
    doc.get(&b.field).is_some_and(|v| values_equal(v, &b.value))
}

/// Equality as the row store applies it; a null target means "is null".
#[must_use]
pub fn field_equals(field: Option<&Bson>, target: &Bson) -> bool {
    if is_null(Some(target)) {
        return is_null(field);
    }
    match field {
        Some(v) if !is_null(Some(v)) => values_equal(v, target),
        _ => false,
    }
}

/// Inequality with SQL semantics: a null or missing field never matches a non-null target.
#[must_use]
pub fn field_not_equals(field: Option<&Bson>, target: &Bson) -> bool {
    if is_null(Some(target)) {
        return !is_null(field);
    }
    match field {
        Some(v) if !is_null(Some(v)) => !values_equal(v, target),
        _ => false,
    }
}

/// Set membership; a null or missing field is never a member.
#[must_use]
pub fn field_in(field: Option<&Bson>, set: &[Bson]) -> bool {
    match field {
        Some(v) if !is_null(Some(v)) => set.iter().any(|x| values_equal(v, x)),
        _ => false,
    }
}

/// Structural equality, numeric across BSON number types, and instant-based between a
/// `DateTime` and an RFC 3339 string.
#[must_use]
pub fn values_equal(a: &Bson, b: &Bson) -> bool {
    if is_num(a) && is_num(b) {
        return compare_numbers(a, b) == Ordering::Equal;
    }
    if is_datetime_pair(a, b) {
        return as_millis(a) == as_millis(b);
    }
    a == b
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_))
}

fn as_i64_num(x: &Bson) -> Option<i64> {
    match x {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        _ => None,
    }
}

fn as_f64_num(x: &Bson) -> f64 {
    match x {
        Bson::Double(f) => *f,
        Bson::Decimal128(d) => d.to_string().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Integers compare exactly; a float is only involved when one side is a float.
fn compare_numbers(a: &Bson, b: &Bson) -> Ordering {
    match (as_i64_num(a), as_i64_num(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(x), None) => cmp_int_float(x, as_f64_num(b)),
        (None, Some(y)) => cmp_int_float(y, as_f64_num(a)).reverse(),
        (None, None) => cmp_floats(as_f64_num(a), as_f64_num(b)),
    }
}

// -0.0 == 0.0; NaN falls back to `total_cmp` placement.
fn cmp_floats(x: f64, y: f64) -> Ordering {
    x.partial_cmp(&y).unwrap_or_else(|| x.total_cmp(&y))
}

// 2^63 as f64, exact.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return 0.0f64.total_cmp(&f);
    }
    if f >= I64_BOUND {
        return Ordering::Less;
    }
    if f < -I64_BOUND {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    #[allow(clippy::cast_possible_truncation)]
    let whole_int = whole as i64;
    i.cmp(&whole_int).then_with(|| cmp_floats(0.0, f - whole))
}

fn is_datetime_pair(a: &Bson, b: &Bson) -> bool {
    matches!(
        (a, b),
        (Bson::DateTime(_), Bson::String(_)) | (Bson::String(_), Bson::DateTime(_))
    ) && as_millis(a).is_some()
        && as_millis(b).is_some()
}

fn as_millis(x: &Bson) -> Option<i64> {
    match x {
        Bson::DateTime(d) => Some(d.timestamp_millis()),
        Bson::String(s) => {
            chrono::DateTime::parse_from_rfc3339(s).ok().map(|d| d.timestamp_millis())
        }
        _ => None,
    }
}

/// Total order over BSON values used for sorting on both paths.
///
/// Strings that parse as RFC 3339 sort as instants alongside `DateTime` values, with
/// the `DateTime` first and then the text breaking ties. Other strings sort as text.
#[must_use]
pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    use bson::Bson as T;
    if is_num(a) && is_num(b) {
        return compare_numbers(a, b);
    }
    if let (Some(x), Some(y)) = (as_millis(a), as_millis(b)) {
        return x.cmp(&y).then_with(|| instant_tiebreak(a).cmp(&instant_tiebreak(b)));
    }
    match (a, b) {
        (T::String(x), T::String(y)) => x.cmp(y),
        (T::Boolean(x), T::Boolean(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn instant_tiebreak(v: &Bson) -> Option<&str> {
    match v {
        Bson::String(s) => Some(s.as_str()),
        _ => None,
    }
}

fn type_rank(v: &Bson) -> u8 {
    use bson::Bson as T;
    match v {
        T::MinKey => 0,
        T::Null | T::Undefined => 1,
        T::Int32(_) | T::Int64(_) | T::Double(_) | T::Decimal128(_) => 2,
        T::String(s) if chrono::DateTime::parse_from_rfc3339(s).is_ok() => 9,
        T::String(_) | T::Symbol(_) => 3,
        T::Document(_) => 4,
        T::Array(_) => 5,
        T::Binary(_) => 6,
        T::ObjectId(_) => 7,
        T::Boolean(_) => 8,
        T::DateTime(_) => 9,
        T::Timestamp(_) => 10,
        T::RegularExpression(_) => 11,
        T::DbPointer(_) => 12,
        T::JavaScriptCode(_) | T::JavaScriptCodeWithScope(_) => 13,
        T::MaxKey => 255,
    }
}
