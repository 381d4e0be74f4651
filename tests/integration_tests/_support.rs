use bson::{Bson, Document, doc};
use rowbridge::MemoryStore;

/// Store with one table holding `rows`.
pub fn store_with(table: &str, rows: Vec<Document>) -> MemoryStore {
    let store = MemoryStore::new();
    store.create_table(table);
    store.insert_many(table, rows);
    store
}

pub fn ids(rows: &[Document]) -> Vec<i32> {
    rows.iter().map(|d| d.get_i32("id").unwrap()).collect()
}

pub fn bookings() -> Vec<Document> {
    vec![
        doc! { "id": 1, "status": "booked", "user": "u1", "note": Bson::Null, "created_at": "2024-05-01T10:00:00Z" },
        doc! { "id": 2, "status": "pending", "user": "u2", "note": "", "created_at": "2024-05-02T10:00:00Z" },
        doc! { "id": 3, "status": "cancelled", "user": "u1", "created_at": "2024-05-03T10:00:00Z" },
        doc! { "id": 4, "status": "booked", "user": "u3", "note": "vip", "created_at": "2024-05-04T10:00:00Z" },
    ]
}
