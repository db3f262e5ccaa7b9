//! In-memory users/organizations store.
//!
//! Handy for tests and for embedding the gate without a database.
//! Clones share the same maps.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::repos::{
    Organization, OrganizationQuery, OrganizationsStore, RepoError, User, UserQuery, UsersStore,
};

#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    users: Arc<RwLock<HashMap<UserQuery, User>>>,
    organizations: Arc<RwLock<HashMap<u64, Organization>>>,
}

fn poisoned<T>(_: T) -> RepoError {
    RepoError::Unavailable("in-memory store lock poisoned".to_string())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) -> Result<(), RepoError> {
        let key = UserQuery {
            name: user.name.clone(),
            provider: user.provider.clone(),
            scheme: user.scheme.clone(),
        };
        self.users.write().map_err(poisoned)?.insert(key, user);
        Ok(())
    }

    pub fn insert_organization(&self, organization: Organization) -> Result<(), RepoError> {
        self.organizations
            .write()
            .map_err(poisoned)?
            .insert(organization.id, organization);
        Ok(())
    }

    pub fn remove_organization(&self, id: u64) -> Result<Option<Organization>, RepoError> {
        Ok(self.organizations.write().map_err(poisoned)?.remove(&id))
    }
}

#[async_trait]
impl UsersStore for InMemoryStore {
    async fn get(&self, query: UserQuery) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().map_err(poisoned)?.get(&query).cloned())
    }
}

#[async_trait]
impl OrganizationsStore for InMemoryStore {
    async fn get(&self, query: OrganizationQuery) -> Result<Option<Organization>, RepoError> {
        Ok(self
            .organizations
            .read()
            .map_err(poisoned)?
            .get(&query.id)
            .cloned())
    }
}
