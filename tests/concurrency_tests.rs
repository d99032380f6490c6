//! Interleaving safety of the ledger commit boundary.

use creditdesk::application::{CreditLedgerService, ProfileService};
use creditdesk::domain::identity::AuthenticatedIdentity;
use creditdesk::domain::ports::{LedgerStoreRef, ProfileStore, TransactionStore};
use creditdesk::domain::profile::Balance;
use creditdesk::error::LedgerError;
use creditdesk::infrastructure::in_memory::InMemoryLedgerStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test]
async fn test_concurrent_loads_sum_exactly() {
    let store: LedgerStoreRef = Arc::new(InMemoryLedgerStore::new());
    let profiles = ProfileService::new(store.clone());
    let ledger = Arc::new(CreditLedgerService::new(store.clone()));

    let agent = profiles
        .ensure_agent(&AuthenticatedIdentity::from_email("maria@desk.io"))
        .await
        .unwrap();
    let client = profiles
        .current_profile(Some(&AuthenticatedIdentity::from_email("ana@example.com")))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 1..=16u32 {
        let ledger = ledger.clone();
        let agent = agent.clone();
        let client_id = client.id;
        handles.push(tokio::spawn(async move {
            ledger
                .load_credits(
                    &agent,
                    client_id,
                    Decimal::from(i),
                    &format!("COMP-{i:04}"),
                    None,
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // 1 + 2 + ... + 16, no lost updates under any interleaving.
    let reloaded = store.get(client.id).await.unwrap().unwrap();
    assert_eq!(reloaded.balance, Balance::new(dec!(136)));
    assert_eq!(reloaded.total_loaded, Balance::new(dec!(136)));
    assert_eq!(reloaded.withdrawable_balance, Balance::new(dec!(136)));
    assert_eq!(store.list_for_profile(client.id).await.unwrap().len(), 16);
}

#[tokio::test]
async fn test_concurrent_overdraws_admit_exactly_one() {
    let store: LedgerStoreRef = Arc::new(InMemoryLedgerStore::new());
    let profiles = ProfileService::new(store.clone());
    let ledger = Arc::new(CreditLedgerService::new(store.clone()));

    let agent = profiles
        .ensure_agent(&AuthenticatedIdentity::from_email("maria@desk.io"))
        .await
        .unwrap();
    let client = profiles
        .current_profile(Some(&AuthenticatedIdentity::from_email("ana@example.com")))
        .await
        .unwrap();
    ledger
        .load_credits(&agent, client.id, dec!(100), "COMP-0001", None)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let ledger = ledger.clone();
        let agent = agent.clone();
        let client_id = client.id;
        handles.push(tokio::spawn(async move {
            ledger.withdraw_credits(&agent, client_id, dec!(80), None).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(LedgerError::InsufficientFunds) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    // The sufficiency check runs under the commit exclusion, so only one of
    // the four 80-credit withdrawals can fit into a 100-credit balance.
    assert_eq!(successes, 1);
    let reloaded = store.get(client.id).await.unwrap().unwrap();
    assert_eq!(reloaded.balance, Balance::new(dec!(20)));
    assert_eq!(store.list_for_profile(client.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_concurrent_first_access_creates_one_profile() {
    let store: LedgerStoreRef = Arc::new(InMemoryLedgerStore::new());
    let profiles = Arc::new(ProfileService::new(store.clone()));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let profiles = profiles.clone();
        handles.push(tokio::spawn(async move {
            profiles
                .current_profile(Some(&AuthenticatedIdentity::from_email("ana@example.com")))
                .await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(store.list_all().await.unwrap().len(), 1);
}
