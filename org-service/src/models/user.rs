use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. Stored in the `users` collection; never serialized
/// into an HTTP response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// MongoDB document ID (UUID string)
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Unique across all users
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password_hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_users_get_distinct_ids() {
        let a = User::new("A".into(), "a@example.com".into(), "hash".into());
        let b = User::new("B".into(), "b@example.com".into(), "hash".into());
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn id_is_stored_as_mongo_primary_key() {
        let user = User::new("A".into(), "a@example.com".into(), "hash".into());
        let doc = mongodb::bson::to_document(&user).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), user.id);
        assert!(doc.get("id").is_none());
    }
}
