//! Persistence for users and organizations.
//!
//! `MongoDb` is the production store. `InMemoryDatastore` backs the test
//! harness and mirrors the unique-index and conditional-update behavior.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use tokio::sync::RwLock;

use super::error::ServiceError;
use crate::models::{Member, Organization, User};

const DUPLICATE_KEY_CODE: i32 = 11000;

#[async_trait]
pub trait Datastore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError>;

    /// Fails with `EmailAlreadyRegistered` when the e-mail is taken.
    async fn insert_user(&self, user: &User) -> Result<(), ServiceError>;

    async fn insert_organization(&self, org: &Organization) -> Result<(), ServiceError>;

    async fn find_organization(
        &self,
        organization_id: &str,
    ) -> Result<Option<Organization>, ServiceError>;

    async fn list_organizations(&self) -> Result<Vec<Organization>, ServiceError>;

    /// Sets the non-empty fields and returns the stored record, or `None`
    /// when no organization has this id.
    async fn update_organization(
        &self,
        organization_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Organization>, ServiceError>;

    /// Returns false when nothing was deleted.
    async fn delete_organization(&self, organization_id: &str) -> Result<bool, ServiceError>;

    /// Appends the member unless the e-mail is already listed. Returns false
    /// when the organization is missing or already has the member.
    async fn add_member(&self, organization_id: &str, member: &Member)
        -> Result<bool, ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, ServiceError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to MongoDB");
            ServiceError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), ServiceError> {
        tracing::info!("Creating MongoDB indexes for org-service");

        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();
        self.users()
            .create_index(email_index, None)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create email index on users collection");
                ServiceError::from(e)
            })?;
        tracing::info!("Created unique index on users.email");

        let org_id_index = IndexModel::builder()
            .keys(doc! { "organization_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("organization_id_unique".to_string())
                    .build(),
            )
            .build();
        self.organizations()
            .create_index(org_id_index, None)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    "Failed to create organization_id index on organizations collection"
                );
                ServiceError::from(e)
            })?;
        tracing::info!("Created unique index on organizations.organization_id");

        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn organizations(&self) -> Collection<Organization> {
        self.db.collection("organizations")
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

#[async_trait]
impl Datastore for MongoDb {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .users()
            .find_one(doc! { "email": email }, None)
            .await?)
    }

    async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
        match self.users().insert_one(user, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(ServiceError::EmailAlreadyRegistered),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_organization(&self, org: &Organization) -> Result<(), ServiceError> {
        self.organizations().insert_one(org, None).await?;
        Ok(())
    }

    async fn find_organization(
        &self,
        organization_id: &str,
    ) -> Result<Option<Organization>, ServiceError> {
        Ok(self
            .organizations()
            .find_one(doc! { "organization_id": organization_id }, None)
            .await?)
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, ServiceError> {
        let cursor = self.organizations().find(doc! {}, None).await?;
        let orgs: Vec<Organization> = cursor.try_collect().await?;
        Ok(orgs)
    }

    async fn update_organization(
        &self,
        organization_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Organization>, ServiceError> {
        let mut set = Document::new();
        if let Some(name) = non_empty(name) {
            set.insert("name", name);
        }
        if let Some(description) = non_empty(description) {
            set.insert("description", description);
        }

        if set.is_empty() {
            return self.find_organization(organization_id).await;
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .organizations()
            .find_one_and_update(
                doc! { "organization_id": organization_id },
                doc! { "$set": set },
                options,
            )
            .await?)
    }

    async fn delete_organization(&self, organization_id: &str) -> Result<bool, ServiceError> {
        let result = self
            .organizations()
            .delete_one(doc! { "organization_id": organization_id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn add_member(
        &self,
        organization_id: &str,
        member: &Member,
    ) -> Result<bool, ServiceError> {
        let member_doc = bson::to_bson(member)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Failed to encode member: {}", e)))?;

        let result = self
            .organizations()
            .update_one(
                doc! {
                    "organization_id": organization_id,
                    "organization_members.email": { "$ne": member.email.as_str() },
                },
                doc! { "$push": { "organization_members": member_doc } },
                None,
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "MongoDB health check failed");
                ServiceError::from(e)
            })?;
        Ok(())
    }
}

/// Datastore kept in process memory, in insertion order.
#[derive(Default)]
pub struct InMemoryDatastore {
    users: RwLock<Vec<User>>,
    organizations: RwLock<Vec<Organization>>,
}

impl InMemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(ServiceError::EmailAlreadyRegistered);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn insert_organization(&self, org: &Organization) -> Result<(), ServiceError> {
        let mut orgs = self.organizations.write().await;
        if orgs.iter().any(|o| o.organization_id == org.organization_id) {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "duplicate organization_id {}",
                org.organization_id
            )));
        }
        orgs.push(org.clone());
        Ok(())
    }

    async fn find_organization(
        &self,
        organization_id: &str,
    ) -> Result<Option<Organization>, ServiceError> {
        let orgs = self.organizations.read().await;
        Ok(orgs
            .iter()
            .find(|o| o.organization_id == organization_id)
            .cloned())
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, ServiceError> {
        Ok(self.organizations.read().await.clone())
    }

    async fn update_organization(
        &self,
        organization_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Organization>, ServiceError> {
        let mut orgs = self.organizations.write().await;
        Ok(orgs
            .iter_mut()
            .find(|o| o.organization_id == organization_id)
            .map(|org| {
                org.apply_update(name, description);
                org.clone()
            }))
    }

    async fn delete_organization(&self, organization_id: &str) -> Result<bool, ServiceError> {
        let mut orgs = self.organizations.write().await;
        let before = orgs.len();
        orgs.retain(|o| o.organization_id != organization_id);
        Ok(orgs.len() < before)
    }

    async fn add_member(
        &self,
        organization_id: &str,
        member: &Member,
    ) -> Result<bool, ServiceError> {
        let mut orgs = self.organizations.write().await;
        match orgs
            .iter_mut()
            .find(|o| o.organization_id == organization_id)
        {
            Some(org) if !org.has_member(&member.email) => {
                org.organization_members.push(member.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User::new("Test".into(), email.into(), "hash".into())
    }

    #[tokio::test]
    async fn in_memory_rejects_duplicate_email() {
        let store = InMemoryDatastore::new();
        store.insert_user(&user("a@example.com")).await.unwrap();

        let err = store.insert_user(&user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::EmailAlreadyRegistered));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn in_memory_add_member_is_conditional() {
        let store = InMemoryDatastore::new();
        let org = Organization::new("Acme".into(), "Widgets".into(), Vec::new());
        store.insert_organization(&org).await.unwrap();

        let member = Member::invited("Jane".into(), "jane@example.com".into());
        assert!(store.add_member(&org.organization_id, &member).await.unwrap());
        assert!(!store.add_member(&org.organization_id, &member).await.unwrap());
        assert!(!store.add_member("missing", &member).await.unwrap());

        let stored = store
            .find_organization(&org.organization_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.organization_members.len(), 1);
    }

    #[tokio::test]
    async fn in_memory_lists_in_insertion_order() {
        let store = InMemoryDatastore::new();
        for name in ["first", "second", "third"] {
            let org = Organization::new(name.into(), String::new(), Vec::new());
            store.insert_organization(&org).await.unwrap();
        }

        let names: Vec<String> = store
            .list_organizations()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn blank_update_fields_are_skipped() {
        assert_eq!(non_empty(Some("")), None);
        assert_eq!(non_empty(Some("x")), Some("x"));
        assert_eq!(non_empty(None), None);
    }
}
