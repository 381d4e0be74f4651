use bson::Document;
use std::cmp::Ordering;

use super::eval::compare_bson;
use super::types::{FindOptions, Order, SortSpec};

/// Lexicographic comparison over the sort keys. A missing field sorts before any value.
#[must_use]
pub fn compare_records(a: &Document, b: &Document, sort: &[SortSpec]) -> Ordering {
    for s in sort {
        let ord = match (a.get(&s.field), b.get(&s.field)) {
            (Some(x), Some(y)) => compare_bson(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if s.order == Order::Asc { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

/// Stable multi-key sort, then truncate. The limit never applies before the sort.
#[must_use]
pub fn shape(mut records: Vec<Document>, sort: &[SortSpec], limit: Option<usize>) -> Vec<Document> {
    // `sort_by` is stable: full ties keep their input order.
    records.sort_by(|a, b| compare_records(a, b, sort));
    if let Some(n) = limit {
        records.truncate(n);
    }
    records
}

/// `shape` with the defaults from `opts` (`created_at` descending, `limit` of 0 ignored).
#[must_use]
pub fn shape_with(records: Vec<Document>, opts: &FindOptions) -> Vec<Document> {
    shape(records, &opts.effective_sort(), opts.effective_limit())
}
