use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use syncreq_contract::AccountRef;
use syncreq_transfer::{AccountDirectory, DeviceConditions};

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    pub storage: StorageSection,
    pub platform: PlatformSection,
    #[serde(default)]
    pub conditions: ConditionsSection,
    #[serde(default)]
    pub accounts: Vec<AccountSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    pub sqlite_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformSection {
    pub api_level: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionsSection {
    pub network_active: bool,
    pub device_idle: bool,
}

impl Default for ConditionsSection {
    fn default() -> Self {
        Self {
            network_active: true,
            device_idle: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountSection {
    pub name: String,
    pub base_url: String,
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&source)
            .with_context(|| format!("invalid config TOML at {}", path.display()))
    }

    pub fn account_directory(&self) -> AccountDirectory {
        AccountDirectory::new(
            self.accounts
                .iter()
                .map(|account| AccountRef::new(&account.name, &account.base_url)),
        )
    }

    pub fn device_conditions(&self) -> DeviceConditions {
        DeviceConditions::new(self.conditions.network_active, self.conditions.device_idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syncreq_transfer::{should_schedule_retry, AccountResolver};

    const SAMPLE: &str = r#"
        [storage]
        sqlite_path = "syncreq.db"

        [platform]
        api_level = 28

        [[accounts]]
        name = "me@host"
        base_url = "https://cloud.example.org"
    "#;

    #[test]
    fn missing_conditions_default_to_online_and_awake() {
        let config: RuntimeConfig = toml::from_str(SAMPLE).expect("parse");

        assert_eq!(config.platform.api_level, 28);
        assert!(!should_schedule_retry(&config.device_conditions()));
    }

    #[test]
    fn configured_accounts_resolve_by_name() {
        let config: RuntimeConfig = toml::from_str(SAMPLE).expect("parse");
        let directory = config.account_directory();

        let account = directory.resolve("me@host").expect("configured");
        assert_eq!(account.base_url, "https://cloud.example.org");
        assert!(directory.resolve("you@host").is_none());
    }

    #[test]
    fn idle_device_is_read_from_config() {
        let config: RuntimeConfig = toml::from_str(&format!(
            "{SAMPLE}\n[conditions]\nnetwork_active = true\ndevice_idle = true\n"
        ))
        .expect("parse");

        assert!(should_schedule_retry(&config.device_conditions()));
    }
}
