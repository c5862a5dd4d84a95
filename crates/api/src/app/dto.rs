use serde::Serialize;

use packrat_core::UserRecord;

// -------------------------
// Response DTOs
// -------------------------

/// Body returned by user creation.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.user_id.to_string(),
            name: record.user_name,
        }
    }
}
