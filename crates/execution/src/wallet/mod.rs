//! Wallet session management.
//!
//! The session tracks which account and chain the injected provider
//! exposes, remembers across runs that the user connected, and reacts to
//! the provider's account and chain notifications.

mod session;

pub use session::{SessionState, SessionStatus, WalletSession};
