use ironbank::utils::setup_logger;
use ironbank::{
    enrich_balances, AccountFetchError, AccountManifest, AccountRegistry, AccountType, Balance,
    BalanceSet, ConfigLookup, Credentials, CurrencyCode, FieldSchema, Settings, Throttle,
};
use log::{error, info, warn, LevelFilter};
use rust_decimal_macros::dec;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Pretend faucet: hands out a fixed balance to any well-formed address.
struct Faucet {
    fields: FieldSchema,
    throttle: Arc<Throttle>,
}

impl AccountType for Faucet {
    fn name(&self) -> &str {
        "Faucet"
    }

    fn code(&self) -> &str {
        "faucet"
    }

    fn fields(&self) -> &FieldSchema {
        &self.fields
    }

    fn fetch_supported_currencies(&self) -> Result<BTreeSet<CurrencyCode>, AccountFetchError> {
        ["btc", "ltc"].iter()
            .map(|c| CurrencyCode::new(c).map_err(|e| AccountFetchError::new(e.to_string())))
            .collect()
    }

    fn fetch_balances(&self, credentials: &Credentials) -> Result<BalanceSet, AccountFetchError> {
        self.throttle.throttle(self.code());
        let address = credentials.text("address").ok_or_else(|| AccountFetchError::new("No address"))?;
        info!("faucet balance for {}", address);

        let mut balances = BalanceSet::new();
        let ltc = CurrencyCode::new("ltc").map_err(|e| AccountFetchError::new(e.to_string()))?;
        balances.insert(ltc, Balance::confirmed(dec!(0.001)).with_unconfirmed(dec!(0.0002)));
        Ok(balances)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger(Some(LevelFilter::Info))?;
    let settings = Arc::new(Settings::from_env()?);
    let factory = settings.currency_factory()?;
    let config: Arc<dyn ConfigLookup> = settings.clone();
    let throttle = Arc::new(Throttle::new(config));

    let mut registry = AccountRegistry::new();
    registry.register(Arc::new(Faucet {
        fields: FieldSchema::builder()
            .pattern("address", "Address", "^L[a-km-zA-HJ-NP-Z1-9]{26,33}$")
            .build()?,
        throttle,
    }))?;

    if let Some(path) = settings.registry_path() {
        for mismatch in AccountManifest::load(&path)?.verify(&registry) {
            warn!("{}", mismatch);
        }
    }

    let credentials = Credentials::new().with("address", "LQ3B36Yv2rBTxdgAdYpU2UcEZsaNwXeATk");
    // one account at a time, the throttle keeps repeated polls apart
    for round in 0..2 {
        for account in registry.active() {
            let errors = account.check_fields(&credentials);
            if !errors.is_empty() {
                for (key, list) in errors.iter() {
                    for err in list {
                        error!("{}: {}", key, err.render());
                    }
                }
                continue;
            }
            match account.fetch_balances(&credentials) {
                Ok(balances) => {
                    for enriched in enrich_balances(&balances, &factory) {
                        info!("round {} {} {}: {}", round, account.code(), enriched.display_name(), enriched.balance.confirmed);
                    }
                }
                Err(err) => error!("{} failed: {}", account.code(), err),
            }
        }
    }
    Ok(())
}
