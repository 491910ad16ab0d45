use super::WorkspaceConfig;
use crate::workspace::ConflictStrategy;

impl WorkspaceConfig {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(target) = std::env::var("FORGE_TARGET")
            && !target.is_empty()
        {
            self.target = target;
        }

        if let Ok(cache_dir) = std::env::var("FORGE_CACHE_DIR")
            && !cache_dir.is_empty()
        {
            self.cache_dir = Some(cache_dir);
        }

        if let Ok(strategy) = std::env::var("FORGE_CONFLICT_STRATEGY")
            && let Ok(strategy) = strategy.parse::<ConflictStrategy>()
        {
            self.conflict_strategy = strategy;
        }
    }
}
