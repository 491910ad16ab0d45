use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

/// Every variable read by `WorkspaceConfig::apply_env_overrides`.
pub(super) const OVERRIDE_VARS: [&str; 3] =
    ["FORGE_TARGET", "FORGE_CACHE_DIR", "FORGE_CONFLICT_STRATEGY"];

static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

/// Exclusive hold on the `FORGE_*` overrides for one test.
///
/// Starts with every override unset and puts the saved values back on drop,
/// before the lock is released.
pub(super) struct OverrideEnv {
    saved: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl OverrideEnv {
    pub(super) fn cleared() -> Self {
        let lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let saved = OVERRIDE_VARS
            .iter()
            .map(|&key| (key, std::env::var(key).ok()))
            .collect();
        for key in OVERRIDE_VARS {
            // SAFETY: ENV_LOCK is held for the life of `self`.
            unsafe {
                std::env::remove_var(key);
            }
        }
        Self { saved, _lock: lock }
    }

    pub(super) fn set(&self, key: &'static str, value: &str) {
        assert!(OVERRIDE_VARS.contains(&key), "{key} is not a Forge override");
        // SAFETY: ENV_LOCK is held for the life of `self`.
        unsafe {
            std::env::set_var(key, value);
        }
    }
}

impl Drop for OverrideEnv {
    fn drop(&mut self) {
        for (key, previous) in &self.saved {
            // SAFETY: `_lock` is dropped only after this body returns.
            unsafe {
                match previous {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
    }
}
