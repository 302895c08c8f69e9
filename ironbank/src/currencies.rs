use crate::models::{Balance, BalanceSet, CurrencyCode};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display metadata about a currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrencyMetadata {
    pub code: CurrencyCode,
    pub name: String,
    #[serde(default)]
    pub cryptocurrency: bool,
    #[serde(default)]
    pub fiat: bool,
    #[serde(default)]
    pub hashable: bool,
}

#[cfg_attr(test, automock)]
pub trait CurrencyFactory {
    fn load_currency(&self, code: &CurrencyCode) -> Option<CurrencyMetadata>;
}

/// Currency factory backed by a fixed table, usually the `[[currency]]` entries of the settings file.
#[derive(Clone, Debug, Default)]
pub struct StaticCurrencyFactory {
    currencies: HashMap<CurrencyCode, CurrencyMetadata>,
}

impl StaticCurrencyFactory {
    pub fn new(currencies: Vec<CurrencyMetadata>) -> StaticCurrencyFactory {
        StaticCurrencyFactory {
            currencies: currencies.into_iter().map(|c| (c.code.clone(), c)).collect(),
        }
    }

    pub fn insert(&mut self, metadata: CurrencyMetadata) {
        self.currencies.insert(metadata.code.clone(), metadata);
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }
}

impl CurrencyFactory for StaticCurrencyFactory {
    fn load_currency(&self, code: &CurrencyCode) -> Option<CurrencyMetadata> {
        self.currencies.get(code).cloned()
    }
}


#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnrichedBalance {
    pub currency: CurrencyCode,
    pub balance: Balance,
    pub metadata: Option<CurrencyMetadata>,
}

impl EnrichedBalance {
    /// Currency name if known, otherwise the upper-cased code.
    pub fn display_name(&self) -> String {
        match &self.metadata {
            Some(metadata) => metadata.name.clone(),
            None => self.currency.as_str().to_uppercase(),
        }
    }
}

/// Attaches display metadata to each balance. Unknown currencies keep `metadata: None`.
pub fn enrich_balances(balances: &BalanceSet, factory: &dyn CurrencyFactory) -> Vec<EnrichedBalance> {
    balances.iter()
        .map(|(currency, balance)| EnrichedBalance {
            currency: currency.clone(),
            balance: balance.clone(),
            metadata: factory.load_currency(currency),
        })
        .collect()
}
