use config::ConfigError;
use std::error::Error;
use std::fmt;

const UNKNOWN_FETCH_FAILURE: &str = "unknown account fetch failure";

/// Raised when a fetch-family operation could not complete: bad credentials,
/// unreachable service, unexpected response. There is no partial result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFetchError {
    message: String,
}

impl AccountFetchError {
    pub fn new(message: impl Into<String>) -> AccountFetchError {
        let message = message.into();
        // callers are promised a readable message
        let message = if message.trim().is_empty() {
            String::from(UNKNOWN_FETCH_FAILURE)
        } else {
            message
        };
        AccountFetchError { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AccountFetchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Account fetch error: {}", self.message)
    }
}

impl Error for AccountFetchError {}

impl From<serde_json::Error> for AccountFetchError {
    fn from(error: serde_json::Error) -> Self {
        AccountFetchError::new(format!("unexpected response: {}", error))
    }
}

impl From<std::io::Error> for AccountFetchError {
    fn from(error: std::io::Error) -> Self {
        AccountFetchError::new(format!("io error: {}", error))
    }
}


#[derive(Debug)]
pub enum IronbankError {
    // currency codes are exactly three characters of [a-z0-9]
    InvalidCurrencyCode(String),

    // account codes are 1-32 characters of [a-z0-9_-]
    InvalidAccountCode(String),

    // another account type already claimed this code
    DuplicateAccountCode(String),

    // a field schema could not be built
    InvalidField { key: String, reason: String },

    Config(ConfigError),

    Manifest(serde_json::Error),

    Io(std::io::Error),
}

impl fmt::Display for IronbankError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IronbankError::InvalidCurrencyCode(code) => write!(f, "invalid currency code '{}'", code),
            IronbankError::InvalidAccountCode(code) => write!(f, "invalid account code '{}'", code),
            IronbankError::DuplicateAccountCode(code) => write!(f, "account code '{}' is already registered", code),
            IronbankError::InvalidField { key, reason } => write!(f, "invalid field '{}': {}", key, reason),
            IronbankError::Config(err) => write!(f, "configuration error: {}", err),
            IronbankError::Manifest(err) => write!(f, "account manifest error: {}", err),
            IronbankError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl Error for IronbankError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            IronbankError::Config(err) => Some(err),
            IronbankError::Manifest(err) => Some(err),
            IronbankError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for IronbankError {
    fn from(error: ConfigError) -> Self {
        IronbankError::Config(error)
    }
}

impl From<serde_json::Error> for IronbankError {
    fn from(error: serde_json::Error) -> Self {
        IronbankError::Manifest(error)
    }
}

impl From<std::io::Error> for IronbankError {
    fn from(error: std::io::Error) -> Self {
        IronbankError::Io(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message_is_replaced() {
        let err = AccountFetchError::new("  ");
        assert!(!err.message().is_empty());
        assert_eq!(err.message(), UNKNOWN_FETCH_FAILURE);
    }

    #[test]
    fn test_json_error_becomes_fetch_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = AccountFetchError::from(json_err);
        assert!(err.message().starts_with("unexpected response"));
        assert!(err.to_string().starts_with("Account fetch error:"));
    }
}
