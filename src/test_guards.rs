//! RAII guard for environment variables mutated by tests.
//!
//! Tests that set `TICKETBOARD_*` variables must restore them even if the
//! test panics. Environment state is process-global, so tests using the guard
//! are also marked `#[serial]`.

use std::env;
use std::ffi::OsString;

/// Restores an environment variable to its snapshot on drop.
pub struct EnvGuard {
    key: String,
    original: Option<OsString>,
}

impl EnvGuard {
    /// Snapshot the current value of `key`.
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            original: env::var_os(key),
        }
    }

    /// Snapshot `key`, then set it to `value`.
    ///
    /// # Safety
    /// Calls `std::env::set_var`; callers must be `#[serial]`.
    pub unsafe fn set(key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        let guard = Self::new(key);
        unsafe { env::set_var(key, value) };
        guard
    }

    /// Snapshot `key`, then remove it.
    ///
    /// # Safety
    /// Calls `std::env::remove_var`; callers must be `#[serial]`.
    pub unsafe fn remove(key: &str) -> Self {
        let guard = Self::new(key);
        unsafe { env::remove_var(key) };
        guard
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: only used from #[serial] tests
        match &self.original {
            Some(val) => unsafe { env::set_var(&self.key, val) },
            None => unsafe { env::remove_var(&self.key) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_env_guard_restores_absent_var() {
        let key = "TICKETBOARD_TEST_GUARD_ABSENT";
        unsafe { env::remove_var(key) };
        {
            let _guard = unsafe { EnvGuard::set(key, "temporary") };
            assert_eq!(env::var(key).unwrap(), "temporary");
        }
        assert!(env::var(key).is_err());
    }

    #[test]
    #[serial]
    fn test_env_guard_remove_restores_value() {
        let key = "TICKETBOARD_TEST_GUARD_REMOVE";
        unsafe { env::set_var(key, "kept") };
        {
            let _guard = unsafe { EnvGuard::remove(key) };
            assert!(env::var(key).is_err());
        }
        assert_eq!(env::var(key).unwrap(), "kept");
        unsafe { env::remove_var(key) };
    }
}
