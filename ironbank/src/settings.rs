use crate::currencies::{CurrencyMetadata, StaticCurrencyFactory};
use crate::errors::IronbankError;
use config::{Config, Environment, File};
use log::info;
#[cfg(test)]
use mockall::automock;
use std::collections::HashMap;

pub const DEFAULT_SETTINGS_PATH: &str = "conf/Settings";

/// Key/value lookup the throttle reads its delays from.
#[cfg_attr(test, automock)]
pub trait ConfigLookup: Send + Sync {
    fn get_u64(&self, key: &str) -> Option<u64>;
}

impl ConfigLookup for HashMap<String, u64> {
    fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).copied()
    }
}

impl ConfigLookup for Config {
    fn get_u64(&self, key: &str) -> Option<u64> {
        self.get::<u64>(key).ok()
    }
}


pub fn throttle_key(code: &str) -> String {
    format!("accounts_{}_throttle", code)
}

pub const GLOBAL_THROTTLE_KEY: &str = "accounts_throttle";

/// Per-account override, then the global override.
pub fn throttle_seconds(config: &dyn ConfigLookup, code: &str) -> Option<u64> {
    config.get_u64(&throttle_key(code)).or_else(|| config.get_u64(GLOBAL_THROTTLE_KEY))
}


#[derive(Debug)]
pub struct Settings {
    config: Config,
}

impl Settings {
    /// Loads `path` (any extension the `config` crate knows) and lets `IRONBANK_*`
    /// environment variables override single keys, e.g. `IRONBANK_ACCOUNTS_THROTTLE=5`.
    pub fn new(path: &str) -> Result<Self, IronbankError> {
        info!("ironbank configuration path:{}", path);
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("IRONBANK"))
            .build()?;
        Ok(Settings { config })
    }

    /// Path from `IRONBANK_CONFIG`, else `conf/Settings` under the working directory.
    pub fn from_env() -> Result<Self, IronbankError> {
        let path = std::env::var("IRONBANK_CONFIG").unwrap_or_else(|_| String::from(DEFAULT_SETTINGS_PATH));
        Settings::new(&path)
    }

    pub fn from_config(config: Config) -> Settings {
        Settings { config }
    }

    pub fn currencies(&self) -> Result<Vec<CurrencyMetadata>, IronbankError> {
        match self.config.get::<Vec<CurrencyMetadata>>("currency") {
            Ok(currencies) => Ok(currencies),
            Err(config::ConfigError::NotFound(_)) => Ok(vec![]),
            Err(err) => Err(err.into()),
        }
    }

    pub fn currency_factory(&self) -> Result<StaticCurrencyFactory, IronbankError> {
        Ok(StaticCurrencyFactory::new(self.currencies()?))
    }

    /// Location of the JSON account manifest, if configured.
    pub fn registry_path(&self) -> Option<String> {
        self.config.get_string("accounts_registry").ok()
    }
}

impl ConfigLookup for Settings {
    fn get_u64(&self, key: &str) -> Option<u64> {
        self.config.get_u64(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CurrencyCode;

    #[test]
    fn test_load_setting() {
        let setting = Settings::new("tests/Settings.toml").unwrap();

        assert_eq!(setting.get_u64(GLOBAL_THROTTLE_KEY), Some(2));
        assert_eq!(throttle_seconds(&setting, "slowpool"), Some(10));
        assert_eq!(throttle_seconds(&setting, "test"), Some(2));
        assert_eq!(setting.registry_path(), Some(String::from("tests/data/accounts.json")));

        let currencies = setting.currencies().unwrap();
        assert_eq!(currencies.len(), 2, "载入数量不对");
        let btc = currencies.iter().find(|c| c.code == CurrencyCode::new("btc").unwrap()).unwrap();
        assert_eq!(btc.name, "Bitcoin");
        assert!(btc.hashable);
    }

    #[test]
    fn test_missing_keys() {
        let setting = Settings::from_config(Config::default());
        assert_eq!(throttle_seconds(&setting, "test"), None);
        assert_eq!(setting.get_u64(GLOBAL_THROTTLE_KEY), None);
        assert!(setting.currencies().unwrap().is_empty());
        assert_eq!(setting.registry_path(), None);
    }

    #[test]
    fn test_hash_map_lookup() {
        let mut lookup: HashMap<String, u64> = HashMap::new();
        lookup.insert(throttle_key("test"), 7);
        assert_eq!(lookup.get_u64("accounts_test_throttle"), Some(7));
        assert_eq!(lookup.get_u64(GLOBAL_THROTTLE_KEY), None);
    }
}
