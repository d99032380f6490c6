use crate::domain::profile::{Profile, ProfileId};
use crate::domain::transaction::{CreditTransaction, TransactionId};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Signed per-field balance deltas for one profile, applied inside
/// `LedgerStore::record`. Pushing the increment into the store (rather than
/// writing back a sum computed by the caller) is what makes concurrent loads
/// against the same profile safe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceEffect {
    pub profile_id: ProfileId,
    pub balance: Decimal,
    pub total_loaded: Decimal,
    pub withdrawable: Decimal,
}

impl BalanceEffect {
    /// A credit load: all three fields grow by `amount`.
    pub fn credit(profile_id: ProfileId, amount: Decimal) -> Self {
        Self {
            profile_id,
            balance: amount,
            total_loaded: amount,
            withdrawable: amount,
        }
    }

    /// A withdrawal or transfer debit: burns available and withdrawable
    /// credit, `total_loaded` stays put.
    pub fn debit(profile_id: ProfileId, amount: Decimal) -> Self {
        Self {
            profile_id,
            balance: -amount,
            total_loaded: Decimal::ZERO,
            withdrawable: -amount,
        }
    }

    /// The receiving side of a transfer: available credit only. Transferred
    /// credit is neither withdrawable nor counted as loaded.
    pub fn receive(profile_id: ProfileId, amount: Decimal) -> Self {
        Self {
            profile_id,
            balance: amount,
            total_loaded: Decimal::ZERO,
            withdrawable: Decimal::ZERO,
        }
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Inserts a new profile. `user_id` is unique; inserting a second profile
    /// for the same user fails with `DuplicateProfile` (the loser of a
    /// first-access race re-reads).
    async fn insert(&self, profile: Profile) -> Result<Profile>;

    async fn get(&self, id: ProfileId) -> Result<Option<Profile>>;

    async fn get_by_user(&self, user_id: &str) -> Result<Option<Profile>>;

    /// Whole-row update for non-balance fields. The stored balance fields
    /// always win over the incoming row; balances move only through
    /// `LedgerStore::record`.
    async fn update(&self, profile: Profile) -> Result<Profile>;

    async fn list_by_agent(&self, agent_id: ProfileId) -> Result<Vec<Profile>>;

    async fn list_all(&self) -> Result<Vec<Profile>>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn get_transaction(&self, id: TransactionId) -> Result<Option<CreditTransaction>>;

    /// Rows where the profile appears as client or agent, most recent first.
    async fn list_for_profile(&self, profile_id: ProfileId) -> Result<Vec<CreditTransaction>>;
}

/// The ledger commit boundary.
#[async_trait]
pub trait LedgerStore: ProfileStore + TransactionStore {
    /// Atomically inserts `tx` and applies `effects` to the referenced
    /// profiles: either every write lands or none does. Effects that would
    /// drive `balance` or `withdrawable_balance` negative fail with
    /// `InsufficientFunds` before anything is written. Implementations
    /// serialize concurrent `record` calls, so interleaved loads can never
    /// lose an update.
    async fn record(
        &self,
        tx: CreditTransaction,
        effects: &[BalanceEffect],
    ) -> Result<CreditTransaction>;
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
