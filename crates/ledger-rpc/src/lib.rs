//! ledger-rpc
//!
//! JSON-RPC 2.0 harness exposing the seven core banking operations for
//! local exercising (§6.4) — not a replacement for the excluded outer
//! REST/auth layer.
//!
//! Namespace: `"ledger"`
//! Methods:
//!   ledger_createDeposit     — deposit into an account
//!   ledger_createWithdraw    — withdraw from an account
//!   ledger_internalTransfer  — transfer between two accounts
//!   ledger_pixTransfer       — transfer by Pix key
//!   ledger_createPixKey      — register a Pix key
//!   ledger_getBalance        — derived account balance
//!   ledger_getStatement      — filtered transaction history
//!   ledger_verifyIntegrity   — run the hash-chain integrity check
//!   ledger_getHealth         — {store_ok, cache_ok, integrity_ok}
//!   ledger_getMetrics        — transaction/fraud counters, total balance gauge

pub mod api;
pub mod server;
pub mod types;

pub use api::{LedgerApiClient, LedgerApiServer};
pub use server::{RpcServer, RpcServerState};
pub use types::{
    RpcHealth, RpcIntegrityFailure, RpcIntegrityReport, RpcMetrics, RpcPixKey,
    RpcStatementFilters, RpcTransaction,
};
