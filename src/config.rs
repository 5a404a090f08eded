use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use crate::filter::DEFAULT_PATTERNS;
use crate::validator::{CachedValidator, CommandValidator, Validator};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TfsourceConfig {
    pub database: PathBuf,
    /// Where `export` writes when no target directory is given
    pub default_export_dir: PathBuf,
    pub validator: ValidatorConfig,
    pub import: ImportConfig,
}

/// External validator settings.
///
/// The default runs `terraform validate` on the one file alone in a fresh
/// scratch directory, without `terraform init`. Content that needs
/// providers, modules or variables declared in sibling files is rejected
/// there. For such sources point `program`/`args` at a wrapper, e.g.
/// `program = "sh"` with
/// `args = ["-c", "terraform init -backend=false -input=false >/dev/null && terraform validate -no-color"]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Name the content is written under inside the validator's working directory
    pub file_name: String,
    pub timeout_secs: u64,
    /// Remember verdicts per content fingerprint
    pub cache: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub patterns: Vec<String>,
    pub exclude: Vec<String>,
    pub io_timeout_secs: u64,
}

impl Default for TfsourceConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(".tfsource").join("sources.db"),
            default_export_dir: PathBuf::from("export"),
            validator: ValidatorConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            program: "terraform".to_string(),
            args: vec!["validate".to_string(), "-no-color".to_string()],
            file_name: "main.tf".to_string(),
            timeout_secs: 60,
            cache: true,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            exclude: Vec::new(),
            io_timeout_secs: 10,
        }
    }
}

impl ValidatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Build the configured validator
    pub fn build(&self) -> anyhow::Result<Arc<dyn Validator>> {
        if self.program.trim().is_empty() {
            anyhow::bail!("validator.program must not be empty");
        }
        if !crate::path::is_safe_relative(&self.file_name) || self.file_name.contains('/') {
            anyhow::bail!("validator.file_name must be a plain file name, got {:?}", self.file_name);
        }

        let command = CommandValidator::new(&self.program, self.args.clone())
            .with_file_name(&self.file_name);
        if self.cache {
            Ok(Arc::new(CachedValidator::new(command)))
        } else {
            Ok(Arc::new(command))
        }
    }
}

impl ImportConfig {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs.max(1))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("tfsource.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<TfsourceConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: TfsourceConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &TfsourceConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("tfsource.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tfsource.toml");
        std::fs::write(
            &path,
            "default_export_dir = \"/srv/export\"\n[validator]\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.default_export_dir, PathBuf::from("/srv/export"));
        assert_eq!(config.validator.timeout(), Duration::from_secs(5));
        assert_eq!(config.validator.program, "terraform");
        assert_eq!(config.import.patterns, vec!["*.tf", "*.tfvars"]);
    }

    #[test]
    fn test_write_config_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tfsource.toml");
        let config = TfsourceConfig::default();

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.database, config.database);
    }

    #[test]
    fn test_build_rejects_nested_file_name() {
        let config = ValidatorConfig {
            file_name: "dir/main.tf".to_string(),
            ..ValidatorConfig::default()
        };
        assert!(config.build().is_err());
        assert!(ValidatorConfig::default().build().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_wrapper_validator_runs_chained_commands() {
        let config = ValidatorConfig {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                "mkdir .terraform && grep -q resource main.tf".to_string(),
            ],
            ..ValidatorConfig::default()
        };
        let validator = config.build().unwrap();

        let valid = validator.validate("resource X {}", config.timeout()).unwrap();
        assert!(valid.is_valid());
        let invalid = validator.validate("variable y {}", config.timeout()).unwrap();
        assert!(!invalid.is_valid());
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("a").join("b").join("sources.db");
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
    }
}
