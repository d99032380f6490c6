use clap::Parser;
use creditdesk::application::{CreditLedgerService, ProfileService};
use creditdesk::domain::identity::AuthenticatedIdentity;
use creditdesk::domain::ports::{LedgerStoreRef, ProfileStore};
use creditdesk::domain::profile::Profile;
use creditdesk::error::LedgerError;
use creditdesk::infrastructure::in_memory::InMemoryLedgerStore;
use creditdesk::interfaces::csv::{Operation, OperationReader, OperationType, ProfileWriter};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store: LedgerStoreRef = match cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => Arc::new(
            creditdesk::infrastructure::rocksdb::RocksDbLedgerStore::open(db_path)
                .into_diagnostic()?,
        ),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' \
                 feature is not enabled. Falling back to In-Memory storage."
            );
            Arc::new(InMemoryLedgerStore::new())
        }
        None => Arc::new(InMemoryLedgerStore::new()),
    };

    let profiles = ProfileService::new(store.clone());
    let ledger = CreditLedgerService::new(store.clone());

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    for op_result in reader.operations() {
        match op_result {
            Ok(op) => {
                if let Err(e) = apply_operation(&profiles, &ledger, op).await {
                    eprintln!("Error applying operation: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {e}");
            }
        }
    }

    let all = store.list_all().await.into_diagnostic()?;
    let stdout = io::stdout();
    let writer = ProfileWriter::new(stdout.lock());
    writer.write_profiles(all).into_diagnostic()?;

    Ok(())
}

async fn apply_operation(
    profiles: &ProfileService,
    ledger: &CreditLedgerService,
    op: Operation,
) -> creditdesk::error::Result<()> {
    let identity = AuthenticatedIdentity::from_email(&op.user);

    match op.r#type {
        OperationType::Enroll => {
            profiles.current_profile(Some(&identity)).await?;
        }
        OperationType::Agent => {
            profiles.ensure_agent(&identity).await?;
        }
        OperationType::Assign => {
            let agent = profiles.current_profile(Some(&identity)).await?;
            let client = resolve(profiles, op.client.as_deref()).await?;
            profiles.assign_agent(&agent, client.id).await?;
        }
        OperationType::Load => {
            let agent = profiles.current_profile(Some(&identity)).await?;
            let client = resolve(profiles, op.client.as_deref()).await?;
            ledger
                .load_credits(
                    &agent,
                    client.id,
                    op.amount.ok_or(LedgerError::InvalidAmount)?,
                    op.receipt.as_deref().unwrap_or(""),
                    op.notes.as_deref(),
                )
                .await?;
        }
        OperationType::Withdraw => {
            let agent = profiles.current_profile(Some(&identity)).await?;
            let client = resolve(profiles, op.client.as_deref()).await?;
            ledger
                .withdraw_credits(
                    &agent,
                    client.id,
                    op.amount.ok_or(LedgerError::InvalidAmount)?,
                    op.notes.as_deref(),
                )
                .await?;
        }
        OperationType::Transfer => {
            let agent = profiles.current_profile(Some(&identity)).await?;
            let source = resolve(profiles, op.client.as_deref()).await?;
            let destination = resolve(profiles, op.counterparty.as_deref()).await?;
            ledger
                .transfer_credits(
                    &agent,
                    source.id,
                    destination.id,
                    op.amount.ok_or(LedgerError::InvalidAmount)?,
                    op.notes.as_deref(),
                )
                .await?;
        }
    }
    Ok(())
}

async fn resolve(
    profiles: &ProfileService,
    user: Option<&str>,
) -> creditdesk::error::Result<Profile> {
    let user = user.ok_or_else(|| LedgerError::ProfileNotFound("<missing>".to_string()))?;
    profiles.find_by_user(user).await
}
