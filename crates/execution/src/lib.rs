//! Wallet session and transaction flows for the AMM client.
//!
//! This crate provides:
//! - The wallet session state machine (connect, auto-connect, network
//!   switching, provider events)
//! - Transaction submission for approvals, swaps and liquidity changes,
//!   awaiting inclusion
//! - Guards against submitting the same action twice
//! - Periodic balance polling
//! - User-facing notifications

/// Prelude module for convenient imports.
pub mod prelude;

/// Periodic balance polling.
pub mod balance;
/// Execution error type.
pub mod error;
/// In-flight action guards.
pub mod guard;
/// User notifications.
pub mod notify;
/// Transaction building and submission.
pub mod transaction;
/// Wallet session management.
pub mod wallet;
