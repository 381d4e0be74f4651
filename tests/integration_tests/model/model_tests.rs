use bson::doc;
use rowbridge::config::{AdapterConfig, DatabaseType};
use rowbridge::normalize::{extract_id, normalize_booking, normalize_id};
use rowbridge::query::{FindOptions, SortSpec, parse_filter};
use rowbridge::{MemoryStore, Model, ModelFactory};
use std::sync::Arc;

fn store() -> Arc<MemoryStore> {
    let s = Arc::new(MemoryStore::new());
    for t in ["users", "events", "bookings"] {
        s.create_table(t);
    }
    s
}

#[tokio::test]
async fn users_crud_round() {
    let cfg = AdapterConfig::default();
    let users = ModelFactory::create_model(store(), "Users", &cfg);
    let ann = users.create(doc! { "userName": "ann", "isAdmin": false }).await.unwrap();
    let bob = users.create(doc! { "userName": "bob", "isAdmin": true }).await.unwrap();
    let ann_id = ann.get_str("id").unwrap();

    let admins = users.find(&parse_filter(&doc! { "isAdmin": true }).unwrap(), &FindOptions::default()).await.unwrap();
    assert_eq!(admins, vec![bob.clone()]);

    let updated = users.find_by_id_and_update(ann_id, doc! { "isAdmin": true }).await.unwrap().unwrap();
    assert!(updated.get_bool("isAdmin").unwrap());
    let by_name = FindOptions::default().with_sort(vec![SortSpec::asc("userName")]);
    let admins = users.find(&parse_filter(&doc! { "isAdmin": true }).unwrap(), &by_name).await.unwrap();
    assert_eq!(admins.len(), 2);
    assert_eq!(admins[0].get_str("userName").unwrap(), "ann");

    let deleted = users.find_by_id_and_delete(ann_id).await.unwrap().unwrap();
    assert_eq!(deleted.get_str("userName").unwrap(), "ann");
    assert!(users.find_by_id(ann_id).await.unwrap().is_none());
}

#[tokio::test]
async fn find_one_and_update_uses_the_or_fallback() {
    let bookings = ModelFactory::create_model(store(), "bookings", &AdapterConfig::default());
    bookings.create(doc! { "id": "b1", "status": "booked", "note": "" }).await.unwrap();
    bookings.create(doc! { "id": "b2", "status": "booked", "note": "vip" }).await.unwrap();
    let f = parse_filter(&doc! { "$or": [ { "note": bson::Bson::Null } ] }).unwrap();
    let upd = bookings.find_one_and_update(&f, doc! { "status": "cancelled" }).await.unwrap().unwrap();
    assert_eq!(upd.get_str("id").unwrap(), "b1");
    assert_eq!(upd.get_str("status").unwrap(), "cancelled");
}

#[tokio::test]
async fn mongodb_ids_and_booking_population() {
    let cfg = AdapterConfig { database_type: Some(DatabaseType::Mongodb), ..Default::default() };
    let s = store();
    let events = ModelFactory::create_model(s.clone(), "events", &cfg);
    let bookings = ModelFactory::create_model(s, "bookings", &cfg);
    let ev = events.create(doc! { "name": "City Museum" }).await.unwrap();
    let ev_id = extract_id(&ev).unwrap();
    let bk = bookings.create(doc! { "event": ev_id.clone() }).await.unwrap();
    assert!(bk.contains_key("_id"));

    let all_events = events.find(&parse_filter(&doc! {}).unwrap(), &FindOptions::default()).await.unwrap();
    let populated = normalize_booking(bk, Some(&all_events));
    let event = populated.get_document("event").unwrap();
    assert_eq!(event.get_str("name").unwrap(), "City Museum");
    assert_eq!(event.get_str("createdAt").unwrap(), event.get_str("created_at").unwrap());

    let as_supabase = normalize_id(ev, DatabaseType::Supabase);
    assert_eq!(as_supabase.get_str("id").unwrap(), ev_id);
}
