use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub, SubAssign};
use uuid::Uuid;

pub type ProfileId = Uuid;

/// A unit-less credit balance ("fichas").
///
/// Wrapper around `rust_decimal::Decimal` so balance fields cannot be mixed
/// up with arbitrary numbers in arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Applies a signed delta, returning the prospective balance.
    pub fn apply(self, delta: Decimal) -> Self {
        Self(self.0 + delta)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// A positive credit amount for ledger operations.
///
/// Construction fails for zero or negative values, so a validated `Amount`
/// can flow through the ledger without re-checking.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidAmount)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Agent,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Agent => "agent",
            Role::Client => "client",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    Active,
    Inactive,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Active => "active",
            ProfileStatus::Inactive => "inactive",
        }
    }
}

/// A principal record: admin, agent, or client.
///
/// Clients carry the credit balances. Invariants across every ledger
/// operation: `balance >= withdrawable_balance >= 0`, `total_loaded` never
/// decreases, and `withdrawable_balance <= total_loaded`. The balance fields
/// are only ever mutated through `LedgerStore::record`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Profile {
    pub id: ProfileId,
    /// Stable id of the authenticated identity owning this profile. Unique.
    pub user_id: String,
    pub role: Role,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    /// Credits currently available to the client.
    pub balance: Balance,
    /// Cumulative credits ever loaded. Monotonically non-decreasing.
    pub total_loaded: Balance,
    /// Portion of `balance` the client may withdraw.
    pub withdrawable_balance: Balance,
    pub status: ProfileStatus,
    /// Agent responsible for this profile, if assigned.
    pub agent_id: Option<ProfileId>,
    pub google_contact_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// A fresh client profile derived from an authenticated identity.
    pub fn new_client(
        user_id: impl Into<String>,
        name: Option<String>,
        email: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            role: Role::Client,
            name,
            email,
            phone: None,
            avatar_url: None,
            balance: Balance::ZERO,
            total_loaded: Balance::ZERO,
            withdrawable_balance: Balance::ZERO,
            status: ProfileStatus::Active,
            agent_id: None,
            google_contact_id: None,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_agent(&self) -> bool {
        self.role == Role::Agent
    }
}
