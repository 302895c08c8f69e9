use crate::settings::{throttle_seconds, ConfigLookup};
use log::info;
#[cfg(test)]
use mockall::automock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_THROTTLE_SECONDS: u64 = 3;

#[cfg_attr(test, automock)]
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration)
    }
}


/** 限流：同一个账户类型的重复请求之间至少等待一段时间。

The first call for a code is free. Every later call for that code waits the configured
number of seconds: `accounts_<code>_throttle`, else `accounts_throttle`, else the default.
Account types share one instance and call [`Throttle::throttle`] before each request
that could be repeated in quick succession.
*/
pub struct Throttle {
    config: Arc<dyn ConfigLookup>,
    sleeper: Arc<dyn Sleeper>,
    last_request: Mutex<HashMap<String, Instant>>,
}

impl Throttle {
    pub fn new(config: Arc<dyn ConfigLookup>) -> Throttle {
        Throttle::with_sleeper(config, Arc::new(ThreadSleeper))
    }

    pub fn with_sleeper(config: Arc<dyn ConfigLookup>, sleeper: Arc<dyn Sleeper>) -> Throttle {
        Throttle {
            config,
            sleeper,
            last_request: Mutex::new(HashMap::new()),
        }
    }

    pub fn throttle(&self, code: &str) -> Duration {
        self.throttle_with_default(code, DEFAULT_THROTTLE_SECONDS)
    }

    /// Returns how long the caller was held back.
    pub fn throttle_with_default(&self, code: &str, default_seconds: u64) -> Duration {
        if self.record_first(code) {
            return Duration::ZERO;
        }

        let seconds = self.delay_seconds(code, default_seconds);
        info!(target: "ironbank::throttle", "{}", throttle_notice(code, seconds));
        let delay = Duration::from_secs(seconds);
        // the map lock is not held here, other codes keep going
        self.sleeper.sleep(delay);
        self.touch(code);
        delay
    }

    pub fn delay_seconds(&self, code: &str, default_seconds: u64) -> u64 {
        throttle_seconds(self.config.as_ref(), code).unwrap_or(default_seconds)
    }

    /// When `code` last passed through the throttle.
    pub fn last_request(&self, code: &str) -> Option<Instant> {
        self.lock().get(code).copied()
    }

    fn record_first(&self, code: &str) -> bool {
        let mut last_request = self.lock();
        if last_request.contains_key(code) {
            return false;
        }
        last_request.insert(code.to_string(), Instant::now());
        true
    }

    fn touch(&self, code: &str) {
        self.lock().insert(code.to_string(), Instant::now());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Instant>> {
        // a panic elsewhere cannot leave a half-written timestamp behind
        self.last_request.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn throttle_notice(code: &str, seconds: u64) -> String {
    format!("Throttling {} for {} seconds", code, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MockConfigLookup;
    use mockall::predicate::eq;

    fn no_config() -> Arc<dyn ConfigLookup> {
        Arc::new(HashMap::<String, u64>::new())
    }

    #[test]
    fn test_first_call_is_free() {
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().times(0);
        let throttle = Throttle::with_sleeper(no_config(), Arc::new(sleeper));

        assert_eq!(throttle.throttle("test"), Duration::ZERO);
        assert!(throttle.last_request("test").is_some());
    }

    #[test]
    fn test_second_call_waits_default() {
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep()
            .with(eq(Duration::from_secs(3)))
            .times(1)
            .returning(|_| thread::sleep(Duration::from_millis(5)));
        let throttle = Throttle::with_sleeper(no_config(), Arc::new(sleeper));

        throttle.throttle("test");
        let first = throttle.last_request("test").unwrap();
        assert_eq!(throttle.throttle("test"), Duration::from_secs(3));
        assert!(throttle.last_request("test").unwrap() > first, "marker not moved after waiting");
    }

    #[test]
    fn test_codes_are_independent() {
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().times(0);
        let throttle = Throttle::with_sleeper(no_config(), Arc::new(sleeper));

        assert_eq!(throttle.throttle("poola"), Duration::ZERO);
        assert_eq!(throttle.throttle("poolb"), Duration::ZERO);
    }

    #[test]
    fn test_delay_prefers_code_then_global() {
        let mut config = MockConfigLookup::new();
        config.expect_get_u64()
            .with(eq("accounts_slowpool_throttle"))
            .returning(|_| Some(10));
        config.expect_get_u64()
            .with(eq("accounts_test_throttle"))
            .returning(|_| None);
        config.expect_get_u64()
            .with(eq("accounts_throttle"))
            .returning(|_| Some(5));
        let throttle = Throttle::with_sleeper(Arc::new(config), Arc::new(MockSleeper::new()));

        assert_eq!(throttle.delay_seconds("slowpool", 3), 10);
        assert_eq!(throttle.delay_seconds("test", 3), 5);
    }

    #[test]
    fn test_explicit_default() {
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep()
            .with(eq(Duration::from_secs(1)))
            .times(1)
            .return_const(());
        let throttle = Throttle::with_sleeper(no_config(), Arc::new(sleeper));

        throttle.throttle_with_default("fastpool", 1);
        assert_eq!(throttle.throttle_with_default("fastpool", 1), Duration::from_secs(1));
    }

    #[test]
    fn test_throttle_notice() {
        assert_eq!(throttle_notice("slowpool", 10), "Throttling slowpool for 10 seconds");
    }
}
