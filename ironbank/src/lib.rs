pub mod accounts;
pub mod currencies;
pub mod errors;
pub mod fields;
pub mod models;
pub mod registry;
pub mod settings;
pub mod throttle;
pub mod validation;

pub mod utils;

pub use accounts::{
    is_valid_account_code, AccountType, AccountTypeInformation, AccountUpdateCallback,
    AccountUpdateCallbacks, DisabledAccount, Miner, SecurityExchange, SelfUpdatingAccount,
    UserInteractionAccount,
};
pub use currencies::{enrich_balances, CurrencyFactory, CurrencyMetadata, EnrichedBalance, StaticCurrencyFactory};
pub use errors::{AccountFetchError, IronbankError};
pub use fields::{Credentials, FieldDescriptor, FieldKind, FieldSchema, FieldSchemaBuilder, FieldValue};
pub use models::{Balance, BalanceSet, CurrencyCode, Decimal, SecurityPosition, SecuritySet};
pub use registry::{AccountManifest, AccountRegistry, ManifestMismatch};
pub use settings::{ConfigLookup, Settings};
pub use throttle::{Sleeper, ThreadSleeper, Throttle};
pub use validation::{check_fields, ValidationError, ValidationErrors};
