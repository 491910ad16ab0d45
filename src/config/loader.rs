use std::io::ErrorKind;
use std::path::Path;

use super::schema::{CONFIG_FILE_NAME, WorkspaceConfig};
use crate::error::{ForgeError, Result};

impl WorkspaceConfig {
    /// Loads `forge.toml` from `workspace` and applies `FORGE_*` overrides.
    /// A missing file yields the defaults.
    pub fn load(workspace: &Path) -> Result<Self> {
        let path = workspace.join(CONFIG_FILE_NAME);
        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml(&contents).map_err(|message| ForgeError::Config {
                message: format!("failed to parse {}: {message}", path.display()),
                suggestion: Some("check the [[registries]] entries and field names".into()),
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no forge.toml, using defaults");
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        config.workspace_dir = workspace.to_path_buf();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> std::result::Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(self.workspace_dir.join(CONFIG_FILE_NAME), toml_str)?;
        Ok(())
    }
}
