//! Record shape helpers for callers that expect either `id` or `_id` keys and
//! camelCase timestamps.

use crate::config::DatabaseType;
use crate::types::Record;
use bson::Bson;

/// Present and not an "empty" value (null, "", false, 0).
fn is_set(v: Option<&Bson>) -> bool {
    match v {
        None | Some(Bson::Null | Bson::Undefined | Bson::Boolean(false)) => false,
        Some(Bson::String(s)) => !s.is_empty(),
        Some(Bson::Int32(0) | Bson::Int64(0)) => false,
        Some(Bson::Double(d)) => *d != 0.0 && !d.is_nan(),
        Some(_) => true,
    }
}

fn id_to_string(v: &Bson) -> String {
    match v {
        Bson::String(s) => s.clone(),
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

/// Copy `from` to `to` when `from` is set and `to` is not.
fn alias(rec: &mut Record, from: &str, to: &str) {
    if is_set(rec.get(from)) && !is_set(rec.get(to)) {
        if let Some(v) = rec.get(from).cloned() {
            rec.insert(to.to_string(), v);
        }
    }
}

/// Primary-key field name for a backend.
#[must_use]
pub const fn id_field_name(db: DatabaseType) -> &'static str {
    db.id_field()
}

/// Move the id into the backend's preferred field. Supabase-style stores get a
/// string `id`; everything else gets `_id`. The other key is removed.
#[must_use]
pub fn normalize_id(mut rec: Record, db: DatabaseType) -> Record {
    match db {
        DatabaseType::Mongodb => {
            if is_set(rec.get("id")) && !is_set(rec.get("_id")) {
                if let Some(v) = rec.remove("id") {
                    rec.insert("_id", v);
                }
            }
        }
        _ => {
            if is_set(rec.get("_id")) && !is_set(rec.get("id")) {
                if let Some(v) = rec.remove("_id") {
                    rec.insert("id", id_to_string(&v));
                }
            }
        }
    }
    rec
}

/// `_id` if set, else `id`, as a string.
#[must_use]
pub fn extract_id(rec: &Record) -> Option<String> {
    ["_id", "id"].into_iter().find_map(|k| rec.get(k).filter(|v| is_set(Some(v))).map(id_to_string))
}

#[must_use]
pub fn normalize_event(mut rec: Record) -> Record {
    alias(&mut rec, "id", "_id");
    alias(&mut rec, "created_at", "createdAt");
    alias(&mut rec, "updated_at", "updatedAt");
    rec
}

#[must_use]
pub fn normalize_user(rec: Record) -> Record {
    normalize_event(rec)
}

/// Aliases the id and `createdAt`, and replaces a string `event` reference with the
/// matching (normalized) event from `events` when one is given.
#[must_use]
pub fn normalize_booking(mut rec: Record, events: Option<&[Record]>) -> Record {
    alias(&mut rec, "id", "_id");
    alias(&mut rec, "created_at", "createdAt");
    let Some(events) = events else { return rec };
    let Some(event_id) = rec.get_str("event").ok().map(str::to_owned) else { return rec };
    let found = events.iter().find(|e| {
        let key = if is_set(e.get("id")) { e.get("id") } else { e.get("_id") };
        key.is_some_and(|k| id_to_string(k) == event_id)
    });
    if let Some(ev) = found {
        rec.insert("event", normalize_event(ev.clone()));
    }
    rec
}
