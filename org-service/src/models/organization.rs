use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Role of a member inside one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Owner,
    Admin,
    /// Granted to every invitee
    #[default]
    Member,
}

/// A user's association with an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Member {
    #[schema(example = "John Doe")]
    pub name: String,
    /// Unique within the owning organization's member list
    #[schema(example = "john@example.com")]
    pub email: String,
    pub access_level: AccessLevel,
}

impl Member {
    pub fn invited(name: String, email: String) -> Self {
        Self {
            name,
            email,
            access_level: AccessLevel::Member,
        }
    }
}

/// An organization document in the `organizations` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// MongoDB document ID (UUID string)
    #[serde(rename = "_id")]
    pub id: String,

    /// Public identifier; immutable once created
    pub organization_id: String,

    pub name: String,

    pub description: String,

    #[serde(default)]
    pub organization_members: Vec<Member>,
}

impl Organization {
    pub fn new(name: String, description: String, members: Vec<Member>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            organization_id: Uuid::new_v4().to_string(),
            name,
            description,
            organization_members: members,
        }
    }

    pub fn has_member(&self, email: &str) -> bool {
        self.organization_members.iter().any(|m| m.email == email)
    }

    /// Overwrites only the fields that carry a non-empty value.
    pub fn apply_update(&mut self, name: Option<&str>, description: Option<&str>) {
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            self.name = name.to_string();
        }
        if let Some(description) = description.filter(|d| !d.is_empty()) {
            self.description = description.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org() -> Organization {
        Organization::new("Acme".into(), "Widgets".into(), Vec::new())
    }

    #[test]
    fn organization_id_differs_from_document_id() {
        let org = org();
        assert_ne!(org.id, org.organization_id);
    }

    #[test]
    fn empty_fields_leave_values_untouched() {
        let mut org = org();
        org.apply_update(Some(""), None);
        assert_eq!(org.name, "Acme");
        assert_eq!(org.description, "Widgets");

        org.apply_update(Some("Acme Corp"), Some(""));
        assert_eq!(org.name, "Acme Corp");
        assert_eq!(org.description, "Widgets");
    }

    #[test]
    fn invited_members_get_member_access() {
        let member = Member::invited("Jane".into(), "jane@example.com".into());
        assert_eq!(member.access_level, AccessLevel::Member);

        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["access_level"], "member");
    }

    #[test]
    fn missing_member_list_decodes_as_empty() {
        let doc = mongodb::bson::doc! {
            "_id": "doc-1",
            "organization_id": "org-1",
            "name": "Acme",
            "description": "Widgets",
        };
        let org: Organization = mongodb::bson::from_document(doc).unwrap();
        assert!(org.organization_members.is_empty());
        assert!(!org.has_member("x@example.com"));
    }
}
