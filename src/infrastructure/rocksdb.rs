use crate::domain::ports::{BalanceEffect, LedgerStore, ProfileStore, TransactionStore};
use crate::domain::profile::{Profile, ProfileId};
use crate::domain::transaction::{CreditTransaction, TransactionId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Column family for profile rows, keyed by profile id.
pub const CF_PROFILES: &str = "profiles";
/// Uniqueness index: user id -> profile id.
pub const CF_PROFILES_BY_USER: &str = "profiles_by_user";
/// Ledger rows keyed by a monotonic big-endian sequence, so iteration order
/// is insertion order.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent ledger store backed by RocksDB.
///
/// `record` commits the transaction row and every touched profile row in a
/// single `WriteBatch`; an async mutex serializes writers so the
/// read-check-write of a commit cannot interleave with another.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbLedgerStore {
    db: Arc<DB>,
    write_gate: Arc<Mutex<()>>,
    next_seq: Arc<AtomicU64>,
}

impl RocksDbLedgerStore {
    /// Opens or creates a database at `path` with the required column
    /// families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_PROFILES, Options::default()),
            ColumnFamilyDescriptor::new(CF_PROFILES_BY_USER, Options::default()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default()),
        ];
        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        let next_seq = {
            let cf = db.cf_handle(CF_TRANSACTIONS).ok_or_else(|| {
                LedgerError::StorageUnavailable("transactions column family not found".to_string())
            })?;
            match db.iterator_cf(cf, IteratorMode::End).next() {
                Some(item) => {
                    let (key, _) = item?;
                    let bytes: [u8; 8] = key.as_ref().try_into().map_err(|_| {
                        LedgerError::StorageUnavailable("malformed ledger key".to_string())
                    })?;
                    u64::from_be_bytes(bytes) + 1
                }
                None => 0,
            }
        };

        Ok(Self {
            db: Arc::new(db),
            write_gate: Arc::new(Mutex::new(())),
            next_seq: Arc::new(AtomicU64::new(next_seq)),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::StorageUnavailable(format!("{name} column family not found"))
        })
    }

    fn read_profile(&self, id: ProfileId) -> Result<Option<Profile>> {
        let cf = self.cf(CF_PROFILES)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_profile(&self, batch: &mut WriteBatch, profile: &Profile) -> Result<()> {
        let cf = self.cf(CF_PROFILES)?;
        batch.put_cf(cf, profile.id.as_bytes(), serde_json::to_vec(profile)?);
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for RocksDbLedgerStore {
    async fn insert(&self, profile: Profile) -> Result<Profile> {
        let _gate = self.write_gate.lock().await;

        let by_user = self.cf(CF_PROFILES_BY_USER)?;
        if self.db.get_cf(by_user, profile.user_id.as_bytes())?.is_some() {
            return Err(LedgerError::DuplicateProfile(profile.user_id));
        }

        let mut batch = WriteBatch::default();
        self.put_profile(&mut batch, &profile)?;
        batch.put_cf(by_user, profile.user_id.as_bytes(), profile.id.as_bytes());
        self.db.write(batch)?;
        Ok(profile)
    }

    async fn get(&self, id: ProfileId) -> Result<Option<Profile>> {
        self.read_profile(id)
    }

    async fn get_by_user(&self, user_id: &str) -> Result<Option<Profile>> {
        let by_user = self.cf(CF_PROFILES_BY_USER)?;
        match self.db.get_cf(by_user, user_id.as_bytes())? {
            Some(id_bytes) => {
                let id = ProfileId::from_slice(&id_bytes).map_err(|_| {
                    LedgerError::StorageUnavailable("malformed profile index".to_string())
                })?;
                self.read_profile(id)
            }
            None => Ok(None),
        }
    }

    async fn update(&self, mut profile: Profile) -> Result<Profile> {
        let _gate = self.write_gate.lock().await;

        let stored = self
            .read_profile(profile.id)?
            .ok_or_else(|| LedgerError::ProfileNotFound(profile.id.to_string()))?;
        // Balances move only through `record`; the stored values win.
        profile.balance = stored.balance;
        profile.total_loaded = stored.total_loaded;
        profile.withdrawable_balance = stored.withdrawable_balance;

        let mut batch = WriteBatch::default();
        self.put_profile(&mut batch, &profile)?;
        self.db.write(batch)?;
        Ok(profile)
    }

    async fn list_by_agent(&self, agent_id: ProfileId) -> Result<Vec<Profile>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|p| p.agent_id == Some(agent_id))
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Profile>> {
        let cf = self.cf(CF_PROFILES)?;
        let mut profiles = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            profiles.push(serde_json::from_slice(&value)?);
        }
        Ok(profiles)
    }
}

#[async_trait]
impl TransactionStore for RocksDbLedgerStore {
    async fn get_transaction(&self, id: TransactionId) -> Result<Option<CreditTransaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let tx: CreditTransaction = serde_json::from_slice(&value)?;
            if tx.id == id {
                return Ok(Some(tx));
            }
        }
        Ok(None)
    }

    async fn list_for_profile(&self, profile_id: ProfileId) -> Result<Vec<CreditTransaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut rows = Vec::new();
        // Reverse key order is reverse insertion order: most recent first.
        for item in self.db.iterator_cf(cf, IteratorMode::End) {
            let (_, value) = item?;
            let tx: CreditTransaction = serde_json::from_slice(&value)?;
            if tx.touches(profile_id) {
                rows.push(tx);
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl LedgerStore for RocksDbLedgerStore {
    async fn record(
        &self,
        tx: CreditTransaction,
        effects: &[BalanceEffect],
    ) -> Result<CreditTransaction> {
        let _gate = self.write_gate.lock().await;

        let mut batch = WriteBatch::default();
        for effect in effects {
            let mut profile = self
                .read_profile(effect.profile_id)?
                .ok_or_else(|| LedgerError::ProfileNotFound(effect.profile_id.to_string()))?;
            profile.balance = profile.balance.apply(effect.balance);
            profile.total_loaded = profile.total_loaded.apply(effect.total_loaded);
            profile.withdrawable_balance =
                profile.withdrawable_balance.apply(effect.withdrawable);
            if profile.balance.is_negative() || profile.withdrawable_balance.is_negative() {
                return Err(LedgerError::InsufficientFunds);
            }
            profile.updated_at = tx.created_at;
            self.put_profile(&mut batch, &profile)?;
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let cf = self.cf(CF_TRANSACTIONS)?;
        batch.put_cf(cf, seq.to_be_bytes(), serde_json::to_vec(&tx)?);
        self.db.write(batch)?;
        Ok(tx)
    }
}
