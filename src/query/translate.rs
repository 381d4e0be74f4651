//! Native path: turn a predicate conjunction into row-store constraints.
//!
//! Each predicate maps to exactly one constraint and constraints are a pure
//! conjunction, so the order of filter keys has no effect on the selected rows.

use crate::errors::DbError;
use bson::Bson;
use serde::Serialize;

use super::types::{
    Filter, FindOptions, Order, Predicate, SortSpec, is_null, options_case_insensitive,
};

/// A single row-store constraint, shaped after PostgREST filter operators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constraint {
    Eq { field: String, value: Bson },
    Neq { field: String, value: Bson },
    In { field: String, values: Vec<Bson> },
    IsNull { field: String },
    NotNull { field: String },
    /// Case-insensitive LIKE. `%` and `_` are wildcards, `\` escapes the next character.
    ILike { field: String, pattern: String },
}

impl Constraint {
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Eq { field, .. }
            | Self::Neq { field, .. }
            | Self::In { field, .. }
            | Self::IsNull { field }
            | Self::NotNull { field }
            | Self::ILike { field, .. } => field,
        }
    }
}

/// Query handed to `RowStore::select`: constraints, ordering and limit are all applied
/// by the store. Limit is applied after ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeQuery {
    pub constraints: Vec<Constraint>,
    pub order: Vec<SortSpec>,
    pub limit: Option<usize>,
}

impl NativeQuery {
    /// Render as PostgREST-style query parameters, e.g. `status=in.(booked,cancelled)`.
    #[must_use]
    pub fn to_postgrest_params(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .constraints
            .iter()
            .map(|c| {
                let rhs = match c {
                    Constraint::Eq { value, .. } => format!("eq.{}", render_scalar(value)),
                    Constraint::Neq { value, .. } => format!("neq.{}", render_scalar(value)),
                    Constraint::In { values, .. } => format!(
                        "in.({})",
                        values.iter().map(render_scalar).collect::<Vec<_>>().join(",")
                    ),
                    Constraint::IsNull { .. } => "is.null".to_string(),
                    Constraint::NotNull { .. } => "not.is.null".to_string(),
                    Constraint::ILike { pattern, .. } => format!("ilike.{pattern}"),
                };
                (c.field().to_string(), rhs)
            })
            .collect();
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|s| {
                    let dir = if s.order == Order::Desc { "desc" } else { "asc" };
                    format!("{}.{dir}", s.field)
                })
                .collect::<Vec<_>>()
                .join(",");
            out.push(("order".to_string(), order));
        }
        if let Some(n) = self.limit {
            out.push(("limit".to_string(), n.to_string()));
        }
        out
    }
}

fn render_scalar(v: &Bson) -> String {
    match v {
        Bson::String(s) => s.clone(),
        Bson::Null | Bson::Undefined => "null".to_string(),
        other => other.to_string(),
    }
}

/// Build the native query for `filter` and `opts`.
///
/// # Errors
/// Returns `DbError::Translation` if the filter holds a predicate the store cannot
/// express: any `Or`, or a pattern whose options are anything but `i`. Callers reroute
/// to the fallback path.
pub fn translate(filter: &Filter, opts: &FindOptions) -> Result<NativeQuery, DbError> {
    let constraints = filter.predicates.iter().map(translate_predicate).collect::<Result<Vec<_>, _>>()?;
    Ok(NativeQuery { constraints, order: opts.effective_sort(), limit: opts.effective_limit() })
}

fn translate_predicate(p: &Predicate) -> Result<Constraint, DbError> {
    Ok(match p {
        Predicate::Equals { field, value } if is_null(Some(value)) => {
            Constraint::IsNull { field: field.clone() }
        }
        Predicate::Equals { field, value } => Constraint::Eq { field: field.clone(), value: value.clone() },
        Predicate::In { field, values } => Constraint::In { field: field.clone(), values: values.clone() },
        Predicate::NotEquals { field, value } if is_null(Some(value)) => {
            Constraint::NotNull { field: field.clone() }
        }
        Predicate::NotEquals { field, value } => {
            Constraint::Neq { field: field.clone(), value: value.clone() }
        }
        Predicate::Exists { field, present: true } => Constraint::NotNull { field: field.clone() },
        Predicate::Exists { field, present: false } => Constraint::IsNull { field: field.clone() },
        Predicate::MatchesPattern { field, pattern, options } => {
            if !options_case_insensitive(options) {
                return Err(DbError::Translation(format!(
                    "case-sensitive pattern on `{field}` has no native operator"
                )));
            }
            // ILIKE has no equivalent for m, s or x.
            if options.chars().any(|c| c != 'i') {
                return Err(DbError::Translation(format!(
                    "pattern options `{options}` on `{field}` have no native operator"
                )));
            }
            Constraint::ILike { field: field.clone(), pattern: format!("%{}%", escape_pattern(pattern)) }
        }
        Predicate::Or(branches) => {
            return Err(DbError::Translation(format!(
                "$or with {} branch(es) has no native operator",
                branches.len()
            )));
        }
    })
}

/// Backslash-escape regex metacharacters and the LIKE wildcards so the pattern is
/// matched as a literal substring.
#[must_use]
pub fn escape_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    for ch in pattern.chars() {
        if matches!(
            ch,
            '.' | '*' | '+' | '?' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\' | '%' | '_'
        ) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
