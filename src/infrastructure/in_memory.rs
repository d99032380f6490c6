use crate::domain::ports::{BalanceEffect, LedgerStore, ProfileStore, TransactionStore};
use crate::domain::profile::{Profile, ProfileId};
use crate::domain::transaction::{CreditTransaction, TransactionId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    profiles: HashMap<ProfileId, Profile>,
    by_user: HashMap<String, ProfileId>,
    /// Append-only; "most recent first" is this log reversed.
    ledger: Vec<CreditTransaction>,
}

/// A thread-safe in-memory ledger store.
///
/// One `RwLock` guards profiles and the transaction log together, so
/// `record` is atomic and serialized by construction. Ideal for tests and
/// for replaying a single CSV stream without persistence.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryLedgerStore {
    async fn insert(&self, profile: Profile) -> Result<Profile> {
        let mut inner = self.inner.write().await;
        if inner.by_user.contains_key(&profile.user_id) {
            return Err(LedgerError::DuplicateProfile(profile.user_id));
        }
        inner.by_user.insert(profile.user_id.clone(), profile.id);
        inner.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn get(&self, id: ProfileId) -> Result<Option<Profile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.get(&id).cloned())
    }

    async fn get_by_user(&self, user_id: &str) -> Result<Option<Profile>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_user
            .get(user_id)
            .and_then(|id| inner.profiles.get(id))
            .cloned())
    }

    async fn update(&self, mut profile: Profile) -> Result<Profile> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .profiles
            .get(&profile.id)
            .ok_or_else(|| LedgerError::ProfileNotFound(profile.id.to_string()))?;
        // Balances move only through `record`; the stored values win.
        profile.balance = stored.balance;
        profile.total_loaded = stored.total_loaded;
        profile.withdrawable_balance = stored.withdrawable_balance;
        inner.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn list_by_agent(&self, agent_id: ProfileId) -> Result<Vec<Profile>> {
        let inner = self.inner.read().await;
        Ok(inner
            .profiles
            .values()
            .filter(|p| p.agent_id == Some(agent_id))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Profile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.values().cloned().collect())
    }
}

#[async_trait]
impl TransactionStore for InMemoryLedgerStore {
    async fn get_transaction(&self, id: TransactionId) -> Result<Option<CreditTransaction>> {
        let inner = self.inner.read().await;
        Ok(inner.ledger.iter().find(|tx| tx.id == id).cloned())
    }

    async fn list_for_profile(&self, profile_id: ProfileId) -> Result<Vec<CreditTransaction>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ledger
            .iter()
            .rev()
            .filter(|tx| tx.touches(profile_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn record(
        &self,
        tx: CreditTransaction,
        effects: &[BalanceEffect],
    ) -> Result<CreditTransaction> {
        let mut inner = self.inner.write().await;

        // Validate every effect before touching anything, so a failure on
        // the second effect of a transfer leaves the first unapplied.
        let mut updated = Vec::with_capacity(effects.len());
        for effect in effects {
            let profile = inner
                .profiles
                .get(&effect.profile_id)
                .ok_or_else(|| LedgerError::ProfileNotFound(effect.profile_id.to_string()))?;
            let mut next = profile.clone();
            next.balance = next.balance.apply(effect.balance);
            next.total_loaded = next.total_loaded.apply(effect.total_loaded);
            next.withdrawable_balance = next.withdrawable_balance.apply(effect.withdrawable);
            if next.balance.is_negative() || next.withdrawable_balance.is_negative() {
                return Err(LedgerError::InsufficientFunds);
            }
            next.updated_at = tx.created_at;
            updated.push(next);
        }

        for profile in updated {
            inner.profiles.insert(profile.id, profile);
        }
        inner.ledger.push(tx.clone());
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{Amount, Balance};
    use crate::domain::transaction::TransactionKind;
    use rust_decimal_macros::dec;

    fn new_profile(user: &str) -> Profile {
        Profile::new_client(user, None, None)
    }

    #[tokio::test]
    async fn test_insert_enforces_user_uniqueness() {
        let store = InMemoryLedgerStore::new();
        store.insert(new_profile("ana")).await.unwrap();

        let result = store.insert(new_profile("ana")).await;
        assert!(matches!(result, Err(LedgerError::DuplicateProfile(_))));
    }

    #[tokio::test]
    async fn test_get_by_user() {
        let store = InMemoryLedgerStore::new();
        let profile = store.insert(new_profile("ana")).await.unwrap();

        let found = store.get_by_user("ana").await.unwrap().unwrap();
        assert_eq!(found.id, profile.id);
        assert!(store.get_by_user("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_preserves_balances() {
        let store = InMemoryLedgerStore::new();
        let profile = store.insert(new_profile("ana")).await.unwrap();
        let agent_id = uuid::Uuid::new_v4();
        let tx = CreditTransaction::completed(
            TransactionKind::Load,
            profile.id,
            agent_id,
            Amount::new(dec!(100)).unwrap(),
            Some("COMP-1".to_string()),
            None,
        );
        store
            .record(tx, &[BalanceEffect::credit(profile.id, dec!(100))])
            .await
            .unwrap();

        // An update built from a stale row must not roll the balance back.
        let mut stale = profile.clone();
        stale.name = Some("Ana".to_string());
        let updated = store.update(stale).await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("Ana"));
        assert_eq!(updated.balance, Balance::new(dec!(100)));
    }

    #[tokio::test]
    async fn test_record_rejects_overdraw_without_writes() {
        let store = InMemoryLedgerStore::new();
        let profile = store.insert(new_profile("ana")).await.unwrap();
        let tx = CreditTransaction::completed(
            TransactionKind::Withdraw,
            profile.id,
            uuid::Uuid::new_v4(),
            Amount::new(dec!(50)).unwrap(),
            None,
            None,
        );

        let result = store
            .record(tx, &[BalanceEffect::debit(profile.id, dec!(50))])
            .await;
        assert!(matches!(result, Err(LedgerError::InsufficientFunds)));

        let reloaded = store.get(profile.id).await.unwrap().unwrap();
        assert_eq!(reloaded.balance, Balance::ZERO);
        assert!(store.list_for_profile(profile.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_for_profile_most_recent_first() {
        let store = InMemoryLedgerStore::new();
        let profile = store.insert(new_profile("ana")).await.unwrap();
        let agent_id = uuid::Uuid::new_v4();

        for receipt in ["COMP-1", "COMP-2", "COMP-3"] {
            let tx = CreditTransaction::completed(
                TransactionKind::Load,
                profile.id,
                agent_id,
                Amount::new(dec!(10)).unwrap(),
                Some(receipt.to_string()),
                None,
            );
            store
                .record(tx, &[BalanceEffect::credit(profile.id, dec!(10))])
                .await
                .unwrap();
        }

        let rows = store.list_for_profile(profile.id).await.unwrap();
        let receipts: Vec<_> = rows
            .iter()
            .map(|tx| tx.receipt_number.as_deref().unwrap())
            .collect();
        assert_eq!(receipts, vec!["COMP-3", "COMP-2", "COMP-1"]);
    }
}
