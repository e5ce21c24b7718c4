//! Static configuration and local persistence for the AMM client.
//!
//! This crate provides:
//! - Loading of the supported networks and per-chain token lists
//! - A small settings repository remembering the wallet connection and
//!   the chosen slippage tolerance between runs

/// Network and token list loading.
pub mod config;
/// Error type shared by the loaders and repositories.
pub mod error;
/// Persisted user settings.
pub mod settings;

pub use config::ConfigLoader;
pub use error::DataError;
pub use settings::{JsonSettingsStore, MemorySettingsStore, Settings, SettingsRepository};
