//! Host-side preferences persisted as pretty JSON under the platform config
//! directory. Writes go through a temp file and rename.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;
use crate::ledger::YearMonth;

const CONFIG_DIR: &str = "installment_core";
const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    /// Month the dashboard opens on; `None` means the current month.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_month: Option<YearMonth>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "pt-BR".into(),
            currency: "BRL".into(),
            default_month: None,
        }
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, LedgerError> {
        let base = dirs::config_dir()
            .ok_or_else(|| LedgerError::Store("no config directory available".into()))?;
        Self::from_base(base)
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, LedgerError> {
        Self::from_base(base)
    }

    fn from_base(base: PathBuf) -> Result<Self, LedgerError> {
        let dir = base.join(CONFIG_DIR);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            path: dir.join(CONFIG_FILE),
        })
    }

    pub fn load(&self) -> Result<Config, LedgerError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    path.with_extension(TMP_SUFFIX)
}
