pub type TableName = String;
pub type RecordId = String;

/// A row as exchanged with the row store. Schema is not enforced here.
pub type Record = bson::Document;
