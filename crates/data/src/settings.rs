//! User settings kept between runs: whether the wallet was connected and
//! the chosen slippage tolerance.

use crate::error::DataError;
use amm_client_domain::slippage::SlippageTolerance;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Persisted settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub connected: bool,
    /// Slippage tolerance in percent, as entered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slippage: Option<Decimal>,
}

impl Settings {
    /// Stored tolerance, or the default when missing, non-positive or out
    /// of range.
    pub fn slippage_tolerance(&self) -> SlippageTolerance {
        self.slippage
            .filter(|p| p.is_sign_positive() && !p.is_zero())
            .and_then(|p| SlippageTolerance::from_percent(p).ok())
            .unwrap_or_default()
    }
}

/// Storage for [`Settings`].
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn load(&self) -> Result<Settings, DataError>;

    async fn save(&self, settings: &Settings) -> Result<(), DataError>;

    async fn set_connected(&self, connected: bool) -> Result<(), DataError> {
        let mut settings = self.load().await?;
        if settings.connected != connected {
            settings.connected = connected;
            self.save(&settings).await?;
        }
        Ok(())
    }

    async fn set_slippage(&self, slippage: SlippageTolerance) -> Result<(), DataError> {
        let mut settings = self.load().await?;
        settings.slippage = Some(slippage.percent());
        self.save(&settings).await
    }
}

/// Settings stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsRepository for JsonSettingsStore {
    /// A missing or unreadable document yields defaults.
    async fn load(&self) -> Result<Settings, DataError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(e) => return Err(DataError::io(&self.path, e)),
        };
        match serde_json::from_str(&text) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt settings file");
                Ok(Settings::default())
            }
        }
    }

    async fn save(&self, settings: &Settings) -> Result<(), DataError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DataError::io(parent, e))?;
        }
        let text =
            serde_json::to_string_pretty(settings).map_err(|e| DataError::json(&self.path, e))?;
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| DataError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "Saved settings");
        Ok(())
    }
}

/// Settings held in memory, for dry runs.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: RwLock<Settings>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

#[async_trait]
impl SettingsRepository for MemorySettingsStore {
    async fn load(&self) -> Result<Settings, DataError> {
        Ok(self.settings.read().await.clone())
    }

    async fn save(&self, settings: &Settings) -> Result<(), DataError> {
        *self.settings.write().await = settings.clone();
        Ok(())
    }
}
