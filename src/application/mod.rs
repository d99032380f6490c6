pub mod ledger;
pub mod profiles;

pub use ledger::CreditLedgerService;
pub use profiles::{ProfileChanges, ProfileService};
