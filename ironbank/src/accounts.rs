use crate::errors::AccountFetchError;
use crate::fields::{Credentials, FieldSchema};
use crate::models::{Balance, BalanceSet, CurrencyCode, Decimal, SecurityPosition, SecuritySet};
use crate::validation::{check_fields, ValidationErrors};
use chrono::NaiveDate;
use log::{debug, error};
use std::collections::BTreeSet;
use std::sync::Mutex;

/** 一个第三方账户类型：矿池，交易所，钱包。

Every fetch may block on network I/O. The only primitive an implementation has to
talk to the service for is [`AccountType::fetch_balances`]; single currency lookups
are derived from it without another round trip.

Optional capabilities are separate traits, discovered through the `as_*` methods.
*/
pub trait AccountType: Send + Sync {
    fn name(&self) -> &str;

    /// Unique, lowercase, 1-32 characters of `[a-z0-9_-]`.
    fn code(&self) -> &str;

    fn fields(&self) -> &FieldSchema;

    fn fetch_supported_currencies(&self) -> Result<BTreeSet<CurrencyCode>, AccountFetchError>;

    /// Every currency with a non-zero position, in one round trip.
    fn fetch_balances(&self, credentials: &Credentials) -> Result<BalanceSet, AccountFetchError>;

    /// `None` when the account holds nothing of `currency`; that is not a failure.
    fn fetch_balance(&self, currency: &CurrencyCode, credentials: &Credentials) -> Result<Option<Balance>, AccountFetchError> {
        let mut balances = self.fetch_balances(credentials).inspect_err(|err| {
            error!(target: "ironbank::accounts", "{} fetch failed: {}", self.code(), err.message());
        })?;
        debug!(target: "ironbank::accounts", "{} returned {} balances", self.code(), balances.len());
        Ok(balances.remove(currency))
    }

    fn fetch_confirmed_balance(&self, currency: &CurrencyCode, credentials: &Credentials) -> Result<Option<Decimal>, AccountFetchError> {
        Ok(self.fetch_balance(currency, credentials)?.map(|balance| balance.confirmed))
    }

    fn check_fields(&self, credentials: &Credentials) -> ValidationErrors {
        check_fields(self.fields(), credentials)
    }

    /// Identifier the external account manifest points at.
    fn implementation(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn as_information(&self) -> Option<&dyn AccountTypeInformation> {
        None
    }

    fn as_miner(&self) -> Option<&dyn Miner> {
        None
    }

    fn as_security_exchange(&self) -> Option<&dyn SecurityExchange> {
        None
    }

    fn as_self_updating(&self) -> Option<&dyn SelfUpdatingAccount> {
        None
    }

    fn as_user_interaction(&self) -> Option<&dyn UserInteractionAccount> {
        None
    }

    fn as_disabled(&self) -> Option<&dyn DisabledAccount> {
        None
    }

    fn is_disabled(&self) -> bool {
        self.as_disabled().is_some()
    }
}


pub trait AccountTypeInformation {
    fn url(&self) -> Option<&str>;
}


/// A miner or mining pool.
pub trait Miner {
    /// Currencies with a meaningful hashrate. An exchange can trade a hashable
    /// currency without mining it, so this may be narrower than the supported set.
    fn fetch_supported_hashrate_currencies(&self) -> Result<BTreeSet<CurrencyCode>, AccountFetchError>;
}


/// An account that also holds tradable securities.
pub trait SecurityExchange {
    fn fetch_securities(&self, credentials: &Credentials) -> Result<SecuritySet, AccountFetchError>;

    fn fetch_security(&self, security: &str, credentials: &Credentials) -> Result<Option<SecurityPosition>, AccountFetchError> {
        let mut securities = self.fetch_securities(credentials)?;
        Ok(securities.remove(security))
    }

    /// Owned units of `security`.
    fn fetch_security_balance(&self, security: &str, credentials: &Credentials) -> Result<Option<Decimal>, AccountFetchError> {
        Ok(self.fetch_security(security, credentials)?.map(|position| position.owned))
    }
}


pub type AccountUpdateCallback = Box<dyn Fn(&Credentials) + Send + Sync>;

/// An account whose credentials change as it is used, e.g. rotating OAuth refresh tokens.
pub trait SelfUpdatingAccount {
    fn register_account_update_callback(&self, callback: AccountUpdateCallback);
}

/// Callback list an implementation embeds to back [`SelfUpdatingAccount`].
#[derive(Default)]
pub struct AccountUpdateCallbacks {
    callbacks: Mutex<Vec<AccountUpdateCallback>>,
}

impl AccountUpdateCallbacks {
    pub fn new() -> AccountUpdateCallbacks {
        AccountUpdateCallbacks::default()
    }

    pub fn register(&self, callback: AccountUpdateCallback) {
        let mut callbacks = self.callbacks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        callbacks.push(callback);
    }

    /// Hands the updated credentials to every registered callback, returns how many ran.
    pub fn notify(&self, updated: &Credentials) -> usize {
        let callbacks = self.callbacks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for callback in callbacks.iter() {
            callback(updated);
        }
        callbacks.len()
    }

    pub fn len(&self) -> usize {
        self.callbacks.lock().map(|c| c.len()).unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}


/// An account whose fields are obtained by walking the user through something
/// (an OAuth redirect) rather than typed in.
pub trait UserInteractionAccount {
    /// `None` while the interaction is incomplete, the field values once it is done.
    fn interaction(&self) -> Result<Option<Credentials>, AccountFetchError>;
}


/// An account type kept only so historical balances can still be listed.
pub trait DisabledAccount {
    fn disabled_at(&self) -> NaiveDate;
}


pub fn is_valid_account_code(code: &str) -> bool {
    (1..=32).contains(&code.len())
        && code.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingPool {
        fields: FieldSchema,
        calls: AtomicUsize,
    }

    impl CountingPool {
        fn new() -> CountingPool {
            CountingPool { fields: FieldSchema::empty(), calls: AtomicUsize::new(0) }
        }
    }

    impl AccountType for CountingPool {
        fn name(&self) -> &str {
            "Counting Pool"
        }

        fn code(&self) -> &str {
            "counting"
        }

        fn fields(&self) -> &FieldSchema {
            &self.fields
        }

        fn fetch_supported_currencies(&self) -> Result<BTreeSet<CurrencyCode>, AccountFetchError> {
            Ok([CurrencyCode::new("btc").unwrap(), CurrencyCode::new("ltc").unwrap()].into_iter().collect())
        }

        fn fetch_balances(&self, _credentials: &Credentials) -> Result<BalanceSet, AccountFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut balances = BalanceSet::new();
            balances.insert(CurrencyCode::new("btc").unwrap(), Balance::confirmed(dec!(1.5)).with_unconfirmed(dec!(0.1)));
            Ok(balances)
        }

        fn as_miner(&self) -> Option<&dyn Miner> {
            Some(self)
        }

        fn as_security_exchange(&self) -> Option<&dyn SecurityExchange> {
            Some(self)
        }
    }

    impl Miner for CountingPool {
        fn fetch_supported_hashrate_currencies(&self) -> Result<BTreeSet<CurrencyCode>, AccountFetchError> {
            Ok([CurrencyCode::new("btc").unwrap()].into_iter().collect())
        }
    }

    impl SecurityExchange for CountingPool {
        fn fetch_securities(&self, _credentials: &Credentials) -> Result<SecuritySet, AccountFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut securities = SecuritySet::new();
            securities.insert(String::from("ASICMINER"), SecurityPosition::owned(dec!(10)).with_available(dec!(8)).with_reserved(dec!(2)));
            Ok(securities)
        }
    }

    #[test]
    fn test_fetch_balance_uses_single_batch_call() {
        let pool = CountingPool::new();
        let btc = CurrencyCode::new("btc").unwrap();
        let ltc = CurrencyCode::new("ltc").unwrap();

        let balance = pool.fetch_balance(&btc, &Credentials::new()).unwrap();
        assert_eq!(balance, Some(Balance::confirmed(dec!(1.5)).with_unconfirmed(dec!(0.1))));
        assert_eq!(pool.calls.load(Ordering::SeqCst), 1);

        assert_eq!(pool.fetch_balance(&ltc, &Credentials::new()).unwrap(), None);
        assert_eq!(pool.fetch_confirmed_balance(&btc, &Credentials::new()).unwrap(), Some(dec!(1.5)));
        assert_eq!(pool.fetch_confirmed_balance(&ltc, &Credentials::new()).unwrap(), None);
        assert_eq!(pool.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_fetch_security_derivations() {
        let pool = CountingPool::new();
        let exchange = pool.as_security_exchange().unwrap();
        assert_eq!(exchange.fetch_security_balance("ASICMINER", &Credentials::new()).unwrap(), Some(dec!(10)));
        assert_eq!(exchange.fetch_security("UNKNOWN", &Credentials::new()).unwrap(), None);
        let position = exchange.fetch_security("ASICMINER", &Credentials::new()).unwrap().unwrap();
        assert_eq!(position.available, Some(dec!(8)));
        assert_eq!(position.reserved, Some(dec!(2)));
    }

    #[test]
    fn test_capability_queries() {
        let pool = CountingPool::new();
        assert!(pool.as_miner().is_some());
        assert!(pool.as_information().is_none());
        assert!(pool.as_self_updating().is_none());
        assert!(pool.as_user_interaction().is_none());
        assert!(!pool.is_disabled());
        assert!(pool.implementation().ends_with("CountingPool"));
    }

    #[test]
    fn test_account_code_format() {
        assert!(is_valid_account_code("test"));
        assert!(is_valid_account_code("btc-e_2"));
        assert!(!is_valid_account_code(""));
        assert!(!is_valid_account_code("Test"));
        assert!(!is_valid_account_code("a.b"));
        assert!(!is_valid_account_code(&"a".repeat(33)));
        assert!(is_valid_account_code(&"a".repeat(32)));
    }

    #[test]
    fn test_update_callbacks() {
        let callbacks = AccountUpdateCallbacks::new();
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = seen.clone();
        callbacks.register(Box::new(move |updated: &Credentials| {
            sink.lock().unwrap().push(updated.text("refresh_token").unwrap_or_default().to_string());
        }));

        let ran = callbacks.notify(&Credentials::new().with("refresh_token", "rt-2"));
        assert_eq!(ran, 1);
        assert_eq!(*seen.lock().unwrap(), vec![String::from("rt-2")]);
    }
}
