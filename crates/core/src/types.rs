/// Catalog primary keys are UUIDs; a template's id doubles as its
/// object-storage directory prefix.
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
