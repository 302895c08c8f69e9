use crate::accounts::{is_valid_account_code, AccountType};
use crate::errors::IronbankError;
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::sync::Arc;

/// Account types available to callers, keyed by their unique code.
#[derive(Default)]
pub struct AccountRegistry {
    accounts: BTreeMap<String, Arc<dyn AccountType>>,
}

impl AccountRegistry {
    pub fn new() -> AccountRegistry {
        AccountRegistry::default()
    }

    pub fn register(&mut self, account: Arc<dyn AccountType>) -> Result<(), IronbankError> {
        let code = account.code().to_string();
        if !is_valid_account_code(&code) {
            return Err(IronbankError::InvalidAccountCode(code));
        }
        if self.accounts.contains_key(&code) {
            return Err(IronbankError::DuplicateAccountCode(code));
        }
        debug!("registered account type {} ({})", code, account.implementation());
        self.accounts.insert(code, account);
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<Arc<dyn AccountType>> {
        self.accounts.get(code).cloned()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.accounts.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item=&Arc<dyn AccountType>> {
        self.accounts.values()
    }

    /// Account types still eligible for live fetches.
    pub fn active(&self) -> impl Iterator<Item=&Arc<dyn AccountType>> {
        self.accounts.values().filter(|account| !account.is_disabled())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}


/// The external account manifest: code -> implementation identifier.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct AccountManifest {
    entries: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestMismatch {
    Missing { code: String },
    WrongImplementation { code: String, expected: String, actual: String },
}

impl fmt::Display for ManifestMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ManifestMismatch::Missing { code } => write!(f, "'{}' is not listed in the account manifest", code),
            ManifestMismatch::WrongImplementation { code, expected, actual } => {
                write!(f, "'{}' points at {} but is implemented by {}", code, expected, actual)
            }
        }
    }
}

impl AccountManifest {
    pub fn load(path: &str) -> Result<AccountManifest, IronbankError> {
        let json = fs::read_to_string(path)?;
        AccountManifest::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<AccountManifest, IronbankError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn implementation(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    /// Every registered code must be listed, pointing at the type that registered it.
    pub fn verify(&self, registry: &AccountRegistry) -> Vec<ManifestMismatch> {
        registry.iter()
            .filter_map(|account| {
                let code = account.code();
                let actual = account.implementation();
                match self.implementation(code) {
                    None => Some(ManifestMismatch::Missing { code: code.to_string() }),
                    Some(expected) if expected != actual => Some(ManifestMismatch::WrongImplementation {
                        code: code.to_string(),
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    }),
                    Some(_) => None,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AccountFetchError;
    use crate::fields::{Credentials, FieldSchema};
    use crate::models::{BalanceSet, CurrencyCode};
    use std::collections::BTreeSet;

    struct NamedAccount {
        code: &'static str,
        fields: FieldSchema,
    }

    impl NamedAccount {
        fn new(code: &'static str) -> Arc<dyn AccountType> {
            Arc::new(NamedAccount { code, fields: FieldSchema::empty() })
        }
    }

    impl AccountType for NamedAccount {
        fn name(&self) -> &str {
            "Named"
        }

        fn code(&self) -> &str {
            self.code
        }

        fn fields(&self) -> &FieldSchema {
            &self.fields
        }

        fn fetch_supported_currencies(&self) -> Result<BTreeSet<CurrencyCode>, AccountFetchError> {
            Ok(BTreeSet::new())
        }

        fn fetch_balances(&self, _credentials: &Credentials) -> Result<BalanceSet, AccountFetchError> {
            Err(AccountFetchError::new("offline"))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = AccountRegistry::new();
        registry.register(NamedAccount::new("poolb")).unwrap();
        registry.register(NamedAccount::new("poola")).unwrap();

        assert_eq!(registry.codes(), vec!["poola", "poolb"]);
        assert_eq!(registry.get("poola").unwrap().code(), "poola");
        assert!(registry.get("poolc").is_none());
        assert_eq!(registry.active().count(), 2);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let mut registry = AccountRegistry::new();
        registry.register(NamedAccount::new("poola")).unwrap();
        let res = registry.register(NamedAccount::new("poola"));
        assert!(matches!(res, Err(IronbankError::DuplicateAccountCode(ref code)) if code == "poola"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_bad_code_rejected() {
        let mut registry = AccountRegistry::new();
        let res = registry.register(NamedAccount::new("Pool A"));
        assert!(matches!(res, Err(IronbankError::InvalidAccountCode(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_manifest_verify() {
        let mut registry = AccountRegistry::new();
        registry.register(NamedAccount::new("poola")).unwrap();
        registry.register(NamedAccount::new("poolb")).unwrap();
        let implementation = registry.get("poola").unwrap().implementation().to_string();

        let json = format!(r#"{{"poola": "{}", "poolb": "somewhere::Else"}}"#, implementation);
        let manifest = AccountManifest::from_json(&json).unwrap();
        let mismatches = manifest.verify(&registry);
        assert_eq!(mismatches.len(), 1);
        assert!(matches!(&mismatches[0], ManifestMismatch::WrongImplementation { code, .. } if code == "poolb"));

        let manifest = AccountManifest::from_json("{}").unwrap();
        assert_eq!(manifest.verify(&registry), vec![
            ManifestMismatch::Missing { code: String::from("poola") },
            ManifestMismatch::Missing { code: String::from("poolb") },
        ]);
    }
}
