use crate::domain::ports::{BalanceEffect, LedgerStore, LedgerStoreRef, ProfileStore};
use crate::domain::profile::{Amount, Profile, ProfileId};
use crate::domain::transaction::{CreditTransaction, TransactionKind};
use crate::error::{LedgerError, Result};
use log::info;
use rust_decimal::Decimal;
use serde_json::json;

/// Validates and records balance-changing transactions.
///
/// Every entry point takes the acting profile explicitly; there is no ambient
/// caller state. Validation runs before any write, and each accepted
/// operation lands as exactly one atomic `LedgerStore::record`: the ledger
/// row and the balance mutation apply together or not at all.
pub struct CreditLedgerService {
    store: LedgerStoreRef,
}

impl CreditLedgerService {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }

    /// Loads `amount` credits onto the client against a paper receipt.
    ///
    /// Validation order, first failure wins: actor role, amount, receipt,
    /// client existence. Deliberately not idempotent: repeating the call with
    /// identical arguments records a second transaction and a second
    /// increment.
    pub async fn load_credits(
        &self,
        agent: &Profile,
        client_id: ProfileId,
        amount: Decimal,
        receipt_number: &str,
        notes: Option<&str>,
    ) -> Result<CreditTransaction> {
        self.require_agent(agent, "load credits")?;
        let amount = Amount::new(amount)?;
        let receipt = receipt_number.trim();
        if receipt.is_empty() {
            return Err(LedgerError::MissingReceipt);
        }
        let client = self.require_profile(client_id).await?;

        let tx = CreditTransaction::completed(
            TransactionKind::Load,
            client.id,
            agent.id,
            amount,
            Some(receipt.to_string()),
            notes.map(str::to_string),
        );
        let recorded = self
            .store
            .record(tx, &[BalanceEffect::credit(client.id, amount.value())])
            .await?;
        info!(
            "loaded {} credits onto {} (receipt {})",
            amount.value(),
            client.user_id,
            receipt
        );
        Ok(recorded)
    }

    /// Withdraws credits from the client's withdrawable balance.
    ///
    /// `total_loaded` is untouched; the sufficiency check runs inside the
    /// store commit, so a concurrent withdrawal cannot slip past it.
    pub async fn withdraw_credits(
        &self,
        agent: &Profile,
        client_id: ProfileId,
        amount: Decimal,
        notes: Option<&str>,
    ) -> Result<CreditTransaction> {
        self.require_agent(agent, "withdraw credits")?;
        let amount = Amount::new(amount)?;
        let client = self.require_profile(client_id).await?;

        let tx = CreditTransaction::completed(
            TransactionKind::Withdraw,
            client.id,
            agent.id,
            amount,
            None,
            notes.map(str::to_string),
        );
        let recorded = self
            .store
            .record(tx, &[BalanceEffect::debit(client.id, amount.value())])
            .await?;
        info!(
            "withdrew {} credits from {}",
            amount.value(),
            client.user_id
        );
        Ok(recorded)
    }

    /// Moves credits from one client to another.
    ///
    /// The source loses available and withdrawable credit; the destination
    /// gains available credit only, so transferred credit can neither be
    /// withdrawn by the recipient nor inflate `total_loaded`.
    pub async fn transfer_credits(
        &self,
        agent: &Profile,
        from_id: ProfileId,
        to_id: ProfileId,
        amount: Decimal,
        notes: Option<&str>,
    ) -> Result<CreditTransaction> {
        self.require_agent(agent, "transfer credits")?;
        let amount = Amount::new(amount)?;
        if from_id == to_id {
            return Err(LedgerError::InvalidTransfer);
        }
        let source = self.require_profile(from_id).await?;
        let destination = self.require_profile(to_id).await?;

        let tx = CreditTransaction::completed(
            TransactionKind::Transfer,
            source.id,
            agent.id,
            amount,
            None,
            notes.map(str::to_string),
        )
        .with_metadata(json!({ "destination_id": destination.id.to_string() }));
        let recorded = self
            .store
            .record(
                tx,
                &[
                    BalanceEffect::debit(source.id, amount.value()),
                    BalanceEffect::receive(destination.id, amount.value()),
                ],
            )
            .await?;
        info!(
            "transferred {} credits from {} to {}",
            amount.value(),
            source.user_id,
            destination.user_id
        );
        Ok(recorded)
    }

    fn require_agent(&self, actor: &Profile, action: &str) -> Result<()> {
        if actor.is_agent() {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(format!(
                "only agents can {action}"
            )))
        }
    }

    async fn require_profile(&self, id: ProfileId) -> Result<Profile> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| LedgerError::ProfileNotFound(id.to_string()))
    }
}
