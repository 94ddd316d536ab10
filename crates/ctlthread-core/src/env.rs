//! Environment variable utilities
//!
//! ```ignore
//! use ctlthread_core::env::{env_get, env_get_bool};
//!
//! let sleep_ms: u64 = env_get("CTL_SLEEP_MS", 500);
//! let guard = env_get_bool("CTL_GUARD", false);
//! ```

use std::str::FromStr;

/// Get environment variable parsed as `T`, or `default` when unset or
/// unparsable
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Get environment variable as boolean
///
/// "1", "true", "yes", "on" (any case) are true, anything else set is
/// false. Unset returns `default`.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[inline]
pub fn env_get_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_get_default() {
        let val: u64 = env_get("__CTL_TEST_UNSET__", 500);
        assert_eq!(val, 500);
        assert!(env_get_bool("__CTL_TEST_UNSET__", true));
        assert_eq!(env_get_str("__CTL_TEST_UNSET__", "retro+"), "retro+");
    }

    #[test]
    fn test_env_get_set() {
        std::env::set_var("__CTL_TEST_SLEEP__", " 250 ");
        let val: u64 = env_get("__CTL_TEST_SLEEP__", 500);
        assert_eq!(val, 250);

        std::env::set_var("__CTL_TEST_SLEEP__", "slow");
        let val: u64 = env_get("__CTL_TEST_SLEEP__", 500);
        assert_eq!(val, 500);
        std::env::remove_var("__CTL_TEST_SLEEP__");
    }

    #[test]
    fn test_env_get_bool_variants() {
        std::env::set_var("__CTL_TEST_BOOL__", "ON");
        assert!(env_get_bool("__CTL_TEST_BOOL__", false));

        std::env::set_var("__CTL_TEST_BOOL__", "0");
        assert!(!env_get_bool("__CTL_TEST_BOOL__", true));
        std::env::remove_var("__CTL_TEST_BOOL__");
    }
}
