use crate::domain::identity::AuthenticatedIdentity;
use crate::domain::ports::{LedgerStoreRef, ProfileStore, TransactionStore};
use crate::domain::profile::{Profile, ProfileId, ProfileStatus, Role};
use crate::domain::transaction::CreditTransaction;
use crate::error::{LedgerError, Result};
use chrono::Utc;
use log::debug;

/// Non-balance profile fields an owner may change.
#[derive(Debug, Default, Clone)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub status: Option<ProfileStatus>,
    pub metadata: Option<serde_json::Value>,
}

/// Resolves profiles for authenticated principals and lists their dependent
/// records.
pub struct ProfileService {
    store: LedgerStoreRef,
}

impl ProfileService {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }

    /// Resolves the caller's profile, creating it lazily on first access.
    ///
    /// New profiles get `role: Client` with name/email derived from the
    /// identity. A caller that loses the first-access race re-reads the
    /// winner's row instead of failing.
    pub async fn current_profile(
        &self,
        identity: Option<&AuthenticatedIdentity>,
    ) -> Result<Profile> {
        let identity = identity.ok_or(LedgerError::NotAuthenticated)?;

        if let Some(existing) = self.store.get_by_user(&identity.user_id).await? {
            return Ok(existing);
        }

        let profile = Profile::new_client(
            identity.user_id.clone(),
            identity.display_name(),
            identity.email.clone(),
        );
        match self.store.insert(profile).await {
            Ok(created) => {
                debug!("created profile {} for user {}", created.id, created.user_id);
                Ok(created)
            }
            Err(LedgerError::DuplicateProfile(_)) => self
                .store
                .get_by_user(&identity.user_id)
                .await?
                .ok_or_else(|| {
                    LedgerError::StorageUnavailable(
                        "profile vanished after losing create race".to_string(),
                    )
                }),
            Err(e) => Err(e),
        }
    }

    /// Looks up a profile by the external user id.
    pub async fn find_by_user(&self, user_id: &str) -> Result<Profile> {
        self.store
            .get_by_user(user_id)
            .await?
            .ok_or_else(|| LedgerError::ProfileNotFound(user_id.to_string()))
    }

    /// Resolves the identity's profile and promotes it to `Agent`.
    ///
    /// Operator bootstrap: agents are provisioned out of band, not by
    /// client-facing flows.
    pub async fn ensure_agent(&self, identity: &AuthenticatedIdentity) -> Result<Profile> {
        let mut profile = self.current_profile(Some(identity)).await?;
        if profile.role != Role::Agent {
            profile.role = Role::Agent;
            profile.updated_at = Utc::now();
            profile = self.store.update(profile).await?;
            debug!("promoted {} to agent", profile.user_id);
        }
        Ok(profile)
    }

    /// Links a client profile to the acting agent.
    pub async fn assign_agent(&self, agent: &Profile, client_id: ProfileId) -> Result<Profile> {
        if !agent.is_agent() {
            return Err(LedgerError::Unauthorized(
                "only agents can take on clients".to_string(),
            ));
        }
        let mut client = self
            .store
            .get(client_id)
            .await?
            .ok_or_else(|| LedgerError::ProfileNotFound(client_id.to_string()))?;
        client.agent_id = Some(agent.id);
        client.updated_at = Utc::now();
        self.store.update(client).await
    }

    /// Profiles assigned to the agent. Empty (never an error) for non-agents.
    pub async fn list_clients(&self, agent: &Profile) -> Result<Vec<Profile>> {
        if !agent.is_agent() {
            return Ok(Vec::new());
        }
        self.store.list_by_agent(agent.id).await
    }

    /// Ledger rows where the profile is client or agent, most recent first.
    pub async fn list_transactions(&self, profile: &Profile) -> Result<Vec<CreditTransaction>> {
        self.store.list_for_profile(profile.id).await
    }

    /// Applies non-balance changes to the caller's own profile.
    pub async fn update_profile(
        &self,
        profile: &Profile,
        changes: ProfileChanges,
    ) -> Result<Profile> {
        let mut current = self
            .store
            .get(profile.id)
            .await?
            .ok_or_else(|| LedgerError::ProfileNotFound(profile.id.to_string()))?;

        if let Some(name) = changes.name {
            current.name = Some(name);
        }
        if let Some(email) = changes.email {
            current.email = Some(email);
        }
        if let Some(phone) = changes.phone {
            current.phone = Some(phone);
        }
        if let Some(avatar_url) = changes.avatar_url {
            current.avatar_url = Some(avatar_url);
        }
        if let Some(status) = changes.status {
            current.status = status;
        }
        if let Some(metadata) = changes.metadata {
            current.metadata = Some(metadata);
        }
        current.updated_at = Utc::now();
        self.store.update(current).await
    }
}
