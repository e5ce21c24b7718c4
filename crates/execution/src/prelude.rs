//! Prelude module for convenient imports.
//!
//! ```rust
//! use amm_client_execution::prelude::*;
//! ```

pub use crate::balance::{BalanceUpdate, BalanceWatcher, DEFAULT_POLL_INTERVAL};
pub use crate::error::ExecutionError;
pub use crate::guard::{ActionGuard, ActionKind, ActionTicket};
pub use crate::notify::{MemoryNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
pub use crate::transaction::{
    TransactionConfig, TransactionManager, TransactionOutcome, needs_approval,
};
pub use crate::wallet::{SessionState, SessionStatus, WalletSession};
