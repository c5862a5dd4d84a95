//! Domain record and view types.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::UserId;

/// A user record as created by the service.
///
/// Users are created once and immutable thereafter; timestamps are assigned
/// by the transactional store, not by the process clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub user_name: String,
}

impl UserRecord {
    /// Build a record for a freshly generated user id.
    ///
    /// The only domain-level validation is a non-empty display name; identifier
    /// uniqueness is the id generator's concern.
    pub fn new(user_id: UserId, user_name: impl Into<String>) -> DomainResult<Self> {
        let user_name = user_name.into();
        if user_name.is_empty() {
            return Err(DomainError::validation("user_name must not be empty"));
        }
        Ok(Self { user_id, user_name })
    }
}

/// One row of the "items this user owns" projection.
///
/// This is the unit that gets serialized into the cache, so the field names
/// here are a wire contract, not an implementation detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    pub user_name: String,
    pub item_name: String,
    pub item_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_record_rejects_empty_name() {
        let err = UserRecord::new(UserId::new(), "").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn item_view_serializes_with_wire_field_names() {
        let view = ItemView {
            user_name: "alice".to_string(),
            item_name: "Sword".to_string(),
            item_id: "item-42".to_string(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["user_name"], "alice");
        assert_eq!(json["item_name"], "Sword");
        assert_eq!(json["item_id"], "item-42");
    }
}
