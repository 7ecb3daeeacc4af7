//! The persistence and transaction-processing crate: idempotency, rate
//! limiting, revocation, account/ledger storage, locking, and the
//! transaction engine that ties them together, built on `sled`.

pub mod engine;
pub mod idempotency;
pub mod lock;
pub mod rate_limit;
pub mod revocation;
pub mod store;

pub use engine::{RequestContext, StepUp, TransactionEngine};
pub use idempotency::IdempotencyCache;
pub use lock::{AccountLockGuard, LockManager};
pub use rate_limit::{FixedWindowLimiter, SlidingWindowLimiter};
pub use revocation::RevocationList;
pub use store::{IntegrityFailure, IntegrityReport, LedgerStore, StatementFilters};
