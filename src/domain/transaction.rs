use crate::domain::profile::{Amount, ProfileId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TransactionId = Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Load,
    Withdraw,
    Transfer,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

/// An immutable record of a balance-changing event.
///
/// Rows are written once with `status: Completed` and never mutated; there is
/// no transition API. `amount` is always positive, the direction comes from
/// `kind`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CreditTransaction {
    pub id: TransactionId,
    pub client_id: ProfileId,
    /// The acting agent.
    pub agent_id: ProfileId,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub receipt_number: Option<String>,
    pub notes: Option<String>,
    pub status: TransactionStatus,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    pub fn completed(
        kind: TransactionKind,
        client_id: ProfileId,
        agent_id: ProfileId,
        amount: Amount,
        receipt_number: Option<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            agent_id,
            amount: amount.value(),
            kind,
            receipt_number,
            notes,
            status: TransactionStatus::Completed,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Whether the profile appears on this row as client or agent.
    pub fn touches(&self, profile_id: ProfileId) -> bool {
        self.client_id == profile_id || self.agent_id == profile_id
    }

    /// Destination profile of a transfer, carried in the row metadata.
    pub fn transfer_destination(&self) -> Option<ProfileId> {
        let raw = self.metadata.as_ref()?.get("destination_id")?.as_str()?;
        Uuid::parse_str(raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_completed_transaction() {
        let client = Uuid::new_v4();
        let agent = Uuid::new_v4();
        let tx = CreditTransaction::completed(
            TransactionKind::Load,
            client,
            agent,
            Amount::new(dec!(500)).unwrap(),
            Some("COMP-0001".to_string()),
            None,
        );
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.amount, dec!(500));
        assert!(tx.touches(client));
        assert!(tx.touches(agent));
        assert!(!tx.touches(Uuid::new_v4()));
    }

    #[test]
    fn test_transfer_destination_roundtrip() {
        let destination = Uuid::new_v4();
        let tx = CreditTransaction::completed(
            TransactionKind::Transfer,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Amount::new(dec!(25)).unwrap(),
            None,
            None,
        )
        .with_metadata(json!({ "destination_id": destination.to_string() }));

        assert_eq!(tx.transfer_destination(), Some(destination));
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&TransactionKind::Load).unwrap();
        assert_eq!(json, "\"load\"");
        let kind: TransactionKind = serde_json::from_str("\"withdraw\"").unwrap();
        assert_eq!(kind, TransactionKind::Withdraw);
    }
}
