use crate::guard::ActionKind;
use alloy_primitives::B256;
use amm_client_data::DataError;
use amm_client_domain::DomainError;
use amm_client_protocols::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("wallet not found")]
    WalletNotFound,
    #[error("wallet not connected")]
    NotConnected,
    #[error("unsupported network {0}")]
    UnsupportedNetwork(u64),
    #[error("{0} already in progress")]
    Busy(ActionKind),
    #[error("transaction {0} was not mined in time")]
    Timeout(B256),
}
