pub mod batch;
pub mod ledger;
pub mod policy;
pub mod report;
pub mod validator;

pub use batch::{BatchRun, BatchValidator};
pub use ledger::{InMemoryLedger, JsonlLedger, Ledger, ValidationRecord};
pub use policy::{PolicyState, RevalidationPolicy};
pub use report::BatchSummary;
pub use validator::SignalValidator;
