use chrono::{DateTime, Utc};

/// Entity keys are the creation instant in Unix milliseconds.
///
/// Two creations inside the same millisecond produce the same key; nothing
/// downstream relies on uniqueness beyond lookups by key.
pub fn key_at(at: DateTime<Utc>) -> String {
    at.timestamp_millis().to_string()
}

pub fn new_key() -> String {
    key_at(Utc::now())
}
