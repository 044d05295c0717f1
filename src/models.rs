use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: Uuid,
    pub body: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A missing `email` decodes as empty so the handler can report it as a
/// missing field rather than a decode failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
    pub user_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListChirpsQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Window into the chirp listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub const MAX_LIMIT: u32 = 100;
    /// `offset + limit` may not pass this many rows.
    pub const MAX_WINDOW: u32 = 10_000;
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: Self::MAX_LIMIT,
            offset: 0,
        }
    }
}

/// Milliseconds are the finest resolution the store keeps, so timestamps are
/// truncated up front to make freshly created records compare equal to
/// re-read ones.
pub fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::<Utc>::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn chirp_serializes_with_snake_case_fields() {
        let id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let now = now_millis();
        let chirp = Chirp {
            id,
            body: "hello".to_string(),
            user_id,
            created_at: now,
            updated_at: now,
        };

        let value: Value = serde_json::to_value(&chirp).expect("serializes");
        assert_eq!(value["id"], json!(id.to_string()));
        assert_eq!(value["user_id"], json!(user_id.to_string()));
        assert_eq!(value["body"], json!("hello"));
        assert!(value["created_at"].is_string());
        assert!(value["updated_at"].is_string());
    }

    #[test]
    fn create_user_request_tolerates_missing_email() {
        let request: CreateUserRequest = serde_json::from_str("{}").expect("decodes");
        assert!(request.email.is_empty());
    }

    #[test]
    fn create_chirp_request_rejects_bad_user_id() {
        let result = serde_json::from_str::<CreateChirpRequest>(
            r#"{"body":"hi","user_id":"not-a-uuid"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn now_millis_has_no_sub_millisecond_part() {
        assert_eq!(now_millis().timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
