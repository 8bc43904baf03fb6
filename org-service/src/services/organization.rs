use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    dtos::organization::{CreateOrganizationRequest, UpdateOrganizationRequest},
    models::{Member, Organization},
    services::{Datastore, ServiceError},
};

/// Organization CRUD and member invitation.
#[derive(Clone)]
pub struct OrganizationService {
    db: Arc<dyn Datastore>,
}

impl OrganizationService {
    pub fn new(db: Arc<dyn Datastore>) -> Self {
        Self { db }
    }

    /// Stores a new organization. Member e-mails must be unique within the list.
    pub async fn create(&self, req: CreateOrganizationRequest) -> Result<String, ServiceError> {
        let mut seen = HashSet::new();
        if !req
            .organization_members
            .iter()
            .all(|member| seen.insert(member.email.as_str()))
        {
            return Err(ServiceError::DuplicateMember);
        }

        let org = Organization::new(req.name, req.description, req.organization_members);
        self.db.insert_organization(&org).await?;

        tracing::info!(organization_id = %org.organization_id, "Organization created");
        Ok(org.organization_id)
    }

    pub async fn get(&self, organization_id: &str) -> Result<Organization, ServiceError> {
        self.db
            .find_organization(organization_id)
            .await?
            .ok_or(ServiceError::OrganizationNotFound)
    }

    pub async fn list(&self) -> Result<Vec<Organization>, ServiceError> {
        self.db.list_organizations().await
    }

    pub async fn update(
        &self,
        organization_id: &str,
        req: UpdateOrganizationRequest,
    ) -> Result<Organization, ServiceError> {
        let org = self
            .db
            .update_organization(
                organization_id,
                req.name.as_deref(),
                req.description.as_deref(),
            )
            .await?
            .ok_or(ServiceError::OrganizationNotFound)?;

        tracing::info!(organization_id = %organization_id, "Organization updated");
        Ok(org)
    }

    pub async fn delete(&self, organization_id: &str) -> Result<(), ServiceError> {
        if !self.db.delete_organization(organization_id).await? {
            return Err(ServiceError::OrganizationNotFound);
        }

        tracing::info!(organization_id = %organization_id, "Organization deleted");
        Ok(())
    }

    /// Adds an existing user to the organization with `member` access.
    pub async fn invite(&self, organization_id: &str, email: &str) -> Result<(), ServiceError> {
        let org = self.get(organization_id).await?;
        if org.has_member(email) {
            return Err(ServiceError::DuplicateMember);
        }

        let user = self
            .db
            .find_user_by_email(email)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let member = Member::invited(user.name, user.email);
        if !self.db.add_member(organization_id, &member).await? {
            // Lost a race: either a concurrent invite added the member or
            // the organization was deleted in between.
            return match self.db.find_organization(organization_id).await? {
                Some(_) => Err(ServiceError::DuplicateMember),
                None => Err(ServiceError::OrganizationNotFound),
            };
        }

        tracing::info!(
            organization_id = %organization_id,
            user_id = %user.id,
            "User invited to organization"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccessLevel, User};
    use crate::services::InMemoryDatastore;

    async fn setup() -> (OrganizationService, Arc<InMemoryDatastore>, String) {
        let db = Arc::new(InMemoryDatastore::new());
        db.insert_user(&User::new(
            "Jane Roe".into(),
            "jane@example.com".into(),
            "hash".into(),
        ))
        .await
        .unwrap();

        let service = OrganizationService::new(db.clone());
        let id = service
            .create(CreateOrganizationRequest {
                name: "Acme".into(),
                description: "Widgets".into(),
                organization_members: Vec::new(),
            })
            .await
            .unwrap();
        (service, db, id)
    }

    #[tokio::test]
    async fn created_organization_starts_without_members() {
        let (service, _, id) = setup().await;
        let org = service.get(&id).await.unwrap();
        assert_eq!(org.name, "Acme");
        assert!(org.organization_members.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_member_emails() {
        let (service, _, _) = setup().await;
        let member = |name: &str| Member::invited(name.to_string(), "dup@example.com".to_string());

        let result = service
            .create(CreateOrganizationRequest {
                name: "Dupes".into(),
                description: "Twice".into(),
                organization_members: vec![member("A"), member("B")],
            })
            .await;

        assert!(matches!(result, Err(ServiceError::DuplicateMember)));
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_ignores_empty_fields() {
        let (service, _, id) = setup().await;
        let org = service
            .update(
                &id,
                UpdateOrganizationRequest {
                    name: Some(String::new()),
                    description: Some("Gadgets".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(org.name, "Acme");
        assert_eq!(org.description, "Gadgets");
    }

    #[tokio::test]
    async fn missing_organization_is_not_found() {
        let (service, _, _) = setup().await;
        assert!(matches!(
            service.get("missing").await,
            Err(ServiceError::OrganizationNotFound)
        ));
        assert!(matches!(
            service
                .update("missing", UpdateOrganizationRequest::default())
                .await,
            Err(ServiceError::OrganizationNotFound)
        ));
        assert!(matches!(
            service.delete("missing").await,
            Err(ServiceError::OrganizationNotFound)
        ));
        assert!(matches!(
            service.invite("missing", "jane@example.com").await,
            Err(ServiceError::OrganizationNotFound)
        ));
    }

    #[tokio::test]
    async fn invite_twice_keeps_one_member() {
        let (service, _, id) = setup().await;
        service.invite(&id, "jane@example.com").await.unwrap();

        assert!(matches!(
            service.invite(&id, "jane@example.com").await,
            Err(ServiceError::DuplicateMember)
        ));

        let org = service.get(&id).await.unwrap();
        assert_eq!(org.organization_members.len(), 1);
        assert_eq!(org.organization_members[0].name, "Jane Roe");
        assert_eq!(org.organization_members[0].access_level, AccessLevel::Member);
    }

    #[tokio::test]
    async fn invite_requires_existing_user() {
        let (service, _, id) = setup().await;
        assert!(matches!(
            service.invite(&id, "ghost@example.com").await,
            Err(ServiceError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn delete_removes_organization() {
        let (service, db, id) = setup().await;
        service.delete(&id).await.unwrap();
        assert!(db.find_organization(&id).await.unwrap().is_none());
    }
}
