//! Tiered loading of [`RegistrySettings`].

use super::RegistrySettings;
use super::merge::deep_merge_all;
use crate::env::{EnvSource, ProcessEnv};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_CONFIG_PATH: &str = "SETTINGS_REGISTRY_CONFIG_PATH";
pub const ENV_DB_PATH: &str = "SETTINGS_REGISTRY_DB_PATH";
pub const ENV_KEY_PREFIX: &str = "SETTINGS_REGISTRY_KEY_PREFIX";
pub const ENV_SECRETS_DIR: &str = "SETTINGS_REGISTRY_SECRETS_DIR";

const CONFIG_FILE: &str = "config.yaml";

/// Settings tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SettingsTier {
    Defaults = 0,
    Project = 1,
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for SettingsTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsTier::Defaults => write!(f, "defaults"),
            SettingsTier::Project => write!(f, "project"),
            SettingsTier::User => write!(f, "user"),
            SettingsTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct SettingsPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
    /// Replaces the project and user files when set.
    pub explicit_file: Option<PathBuf>,
}

impl Default for SettingsPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl SettingsPaths {
    /// `./settings-registry` and `~/.settings-registry`.
    pub fn discover() -> Self {
        Self {
            project_dir: Some(PathBuf::from("settings-registry")),
            user_dir: dirs::home_dir().map(|home| home.join(".settings-registry")),
            explicit_file: None,
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
            explicit_file: None,
        }
    }

    pub fn with_explicit_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(file.into());
        self
    }
}

/// Loads and merges the settings tiers.
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    pub paths: SettingsPaths,
    settings: RegistrySettings,
    /// Highest-priority file that contributed, if any.
    source_file: Option<PathBuf>,
}

impl SettingsLoader {
    pub fn load() -> Result<Self> {
        Self::load_with(SettingsPaths::discover(), &ProcessEnv)
    }

    /// Load with explicit directories and environment.
    pub fn load_with(paths: SettingsPaths, env: &dyn EnvSource) -> Result<Self> {
        let mut documents = vec![serde_json::to_value(RegistrySettings::default())?];
        let mut source_file = None;

        let explicit = paths
            .explicit_file
            .clone()
            .or_else(|| env.var(ENV_CONFIG_PATH).map(PathBuf::from));

        if let Some(path) = explicit {
            let document = read_yaml(&path)?
                .with_context(|| format!("config file not found: {}", path.display()))?;
            documents.push(document);
            source_file = Some(path);
        } else {
            for (tier, dir) in [
                (SettingsTier::Project, &paths.project_dir),
                (SettingsTier::User, &paths.user_dir),
            ] {
                let Some(dir) = dir else { continue };
                let path = dir.join(CONFIG_FILE);
                match read_yaml(&path) {
                    Ok(Some(document)) => {
                        debug!(tier = %tier, path = %path.display(), "Loaded settings file");
                        documents.push(document);
                        source_file = Some(path);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(tier = %tier, path = %path.display(), error = %e, "Ignoring unreadable settings file");
                    }
                }
            }
        }

        let merged = deep_merge_all(documents);
        let mut settings: RegistrySettings =
            serde_json::from_value(merged).context("invalid registry settings")?;
        apply_env_overrides(&mut settings, env);

        Ok(Self {
            paths,
            settings,
            source_file,
        })
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RegistrySettings {
        &mut self.settings
    }

    pub fn into_settings(self) -> RegistrySettings {
        self.settings
    }

    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }
}

/// `Ok(None)` when the file does not exist.
fn read_yaml(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(value))
}

fn apply_env_overrides(settings: &mut RegistrySettings, env: &dyn EnvSource) {
    if let Some(db_path) = env.var(ENV_DB_PATH) {
        settings.store.db_path = PathBuf::from(db_path);
    }
    if let Some(prefix) = env.var(ENV_KEY_PREFIX) {
        settings.store.key_prefix = prefix;
    }
    if let Some(dir) = env.var(ENV_SECRETS_DIR) {
        settings.secrets_dir = Some(PathBuf::from(dir));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::StaticEnv;
    use tempfile::TempDir;

    fn paths(temp: &TempDir) -> SettingsPaths {
        SettingsPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        )
    }

    fn write(dir: &Path, content: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE), content).unwrap();
    }

    #[test]
    fn test_defaults_only() {
        let temp = TempDir::new().unwrap();
        let loader = SettingsLoader::load_with(paths(&temp), &StaticEnv::new()).unwrap();
        assert_eq!(loader.settings(), &RegistrySettings::default());
        assert!(loader.source_file().is_none());
    }

    #[test]
    fn test_user_overrides_project_field_by_field() {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("project"),
            "store:\n  db_path: project.db\n  key_prefix: proj\n",
        );
        write(&temp.path().join("user"), "store:\n  key_prefix: mine\n");

        let loader = SettingsLoader::load_with(paths(&temp), &StaticEnv::new()).unwrap();
        let settings = loader.settings();
        assert_eq!(settings.store.db_path, PathBuf::from("project.db"));
        assert_eq!(settings.store.key_prefix, "mine");
        assert_eq!(loader.source_file(), Some(temp.path().join("user").join(CONFIG_FILE).as_path()));
    }

    #[test]
    fn test_environment_wins() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("project"), "secrets_dir: from-file\n");
        let env = StaticEnv::new()
            .with(ENV_SECRETS_DIR, "from-env")
            .with(ENV_KEY_PREFIX, "env");

        let settings = SettingsLoader::load_with(paths(&temp), &env)
            .unwrap()
            .into_settings();
        assert_eq!(settings.secrets_dir, Some(PathBuf::from("from-env")));
        assert_eq!(settings.store.key_prefix, "env");
    }

    #[test]
    fn test_explicit_path_replaces_file_tiers() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("project"), "store:\n  key_prefix: proj\n");
        let explicit = temp.path().join("explicit.yaml");
        std::fs::write(&explicit, "store:\n  db_path: explicit.db\n").unwrap();

        let env = StaticEnv::new().with(ENV_CONFIG_PATH, explicit.to_string_lossy());
        let settings = SettingsLoader::load_with(paths(&temp), &env)
            .unwrap()
            .into_settings();
        assert_eq!(settings.store.db_path, PathBuf::from("explicit.db"));
        assert_eq!(settings.store.key_prefix, "config");
    }

    #[test]
    fn test_explicit_file_beats_env_path() {
        let temp = TempDir::new().unwrap();
        let from_paths = temp.path().join("a.yaml");
        let from_env = temp.path().join("b.yaml");
        std::fs::write(&from_paths, "store:\n  key_prefix: a\n").unwrap();
        std::fs::write(&from_env, "store:\n  key_prefix: b\n").unwrap();

        let env = StaticEnv::new().with(ENV_CONFIG_PATH, from_env.to_string_lossy());
        let settings = SettingsLoader::load_with(paths(&temp).with_explicit_file(&from_paths), &env)
            .unwrap()
            .into_settings();
        assert_eq!(settings.store.key_prefix, "a");
    }

    #[test]
    fn test_missing_explicit_path_is_error() {
        let temp = TempDir::new().unwrap();
        let env = StaticEnv::new().with(ENV_CONFIG_PATH, "/nonexistent/config.yaml");
        assert!(SettingsLoader::load_with(paths(&temp), &env).is_err());
    }

    #[test]
    fn test_broken_project_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("project"), "store: [unclosed\n");
        let loader = SettingsLoader::load_with(paths(&temp), &StaticEnv::new()).unwrap();
        assert_eq!(loader.settings(), &RegistrySettings::default());
    }
}
