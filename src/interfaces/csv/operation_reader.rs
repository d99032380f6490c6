use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Client sign-up: resolves (or lazily creates) the profile for `user`.
    Enroll,
    /// Operator bootstrap of an agent profile for `user`.
    Agent,
    /// Links `client` to the acting agent in `user`.
    Assign,
    Load,
    Withdraw,
    /// Moves credit from `client` to `counterparty`.
    Transfer,
}

/// One row of the operations stream.
///
/// Columns: `type, user, client, counterparty, amount, receipt, notes`.
/// `user` is always the acting identity; the remaining columns are empty
/// where the operation does not use them.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Operation {
    pub r#type: OperationType,
    pub user: String,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Reads ledger operations from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// yielding `Result<Operation>` lazily so large streams never load into
/// memory at once.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    /// Creates a reader over any `Read` source (file, stdin, byte slice).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn operations(self) -> impl Iterator<Item = Result<Operation>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
