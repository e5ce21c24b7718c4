use thiserror::Error;

/// EIP-1193 code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-1193 code for a method the provider does not support.
pub const UNSUPPORTED_METHOD_CODE: i64 = 4200;
/// Wallet code for a chain that has not been added yet.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// Failures reported by a wallet provider or RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("no wallet provider found")]
    NotFound,
    #[error("user rejected the request")]
    UserRejected,
    #[error("chain has not been added to the wallet")]
    UnrecognizedChain,
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Maps a JSON-RPC error object onto the well-known wallet codes.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        match code {
            USER_REJECTED_CODE => Self::UserRejected,
            UNRECOGNIZED_CHAIN_CODE => Self::UnrecognizedChain,
            _ => Self::Rpc {
                code,
                message: message.into(),
            },
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            Self::UserRejected => Some(USER_REJECTED_CODE),
            Self::UnrecognizedChain => Some(UNRECOGNIZED_CHAIN_CODE),
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

impl From<alloy_sol_types::Error> for ProviderError {
    fn from(e: alloy_sol_types::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
