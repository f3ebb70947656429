use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Default location of the TOML config file.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from built-in defaults, `config/Config.toml`, and
    /// `SENTISTOCK_` environment variables, in increasing priority.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be parsed or is invalid.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads configuration using a specific TOML file.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be parsed or is invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        let config = Self::figment(path)
            .extract::<AppConfig>()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SENTISTOCK_").split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_spec::ModelKind;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.experiment.windows, vec![5, 15, 30]);
        assert_eq!(config.schedule.cron, "0 30 23 * * *");
    }

    #[test]
    fn toml_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[storage]
data_dir = "/var/lib/sentistock"

[experiment]
windows = [3, 7]
features = ["close", "avg_positive"]

[[experiment.grid]]
model = "decisiontree"
params = {{ max_depth = 4 }}
"#
        )
        .unwrap();

        let config = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(
            config.storage.data_dir,
            std::path::PathBuf::from("/var/lib/sentistock")
        );
        assert_eq!(config.storage.model_dir, std::path::PathBuf::from("models"));
        assert_eq!(config.experiment.windows, vec![3, 7]);
        assert_eq!(config.experiment.features.len(), 2);
        assert_eq!(config.experiment.grid.len(), 1);
        assert_eq!(config.experiment.grid[0].model, ModelKind::DecisionTree);
        assert_eq!(config.experiment.grid[0].params.max_depth, Some(4));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Config.toml");
        std::fs::write(&path, "[experiment]\ntrain_fraction = 1.5\n").unwrap();
        assert!(ConfigLoader::load_from(&path).is_err());
    }
}
