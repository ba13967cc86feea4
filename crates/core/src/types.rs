/// Surrogate primary keys (classifications, answers, tasks) are
/// PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Comments and media carry the platform's own opaque string ids.
pub type ExternalId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
