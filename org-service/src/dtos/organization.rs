use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Member, Organization};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Acme")]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    #[schema(example = "Widgets and gadgets")]
    pub description: String,

    #[serde(default)]
    pub organization_members: Vec<Member>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedOrganizationResponse {
    #[schema(example = "3f2b5a8e-1c4d-4e6f-9a0b-7c8d9e0f1a2b")]
    pub organization_id: String,
}

/// Empty or absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateOrganizationRequest {
    #[schema(example = "Acme Corp")]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InviteRequest {
    #[validate(email(message = "Invalid email address"))]
    #[schema(example = "jane@example.com")]
    pub user_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationResponse {
    pub organization_id: String,
    pub name: String,
    pub description: String,
    pub organization_members: Vec<Member>,
}

impl From<Organization> for OrganizationResponse {
    fn from(org: Organization) -> Self {
        Self {
            organization_id: org.organization_id,
            name: org.name,
            description: org.description,
            organization_members: org.organization_members,
        }
    }
}
