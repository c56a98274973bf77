//! quizvault configuration.
//!
//! Note: `QuizvaultConfig` has a custom Debug impl that masks the secret.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::Envelope;
use crate::error::ConfigError;
use crate::store::RecordStore;

/// Name of the config file looked up in the current directory.
pub const LOCAL_CONFIG: &str = "quizvault.toml";

/// Top-level quizvault configuration.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizvaultConfig {
    /// Directory holding the data files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Question bank file name, relative to `data_dir`.
    #[serde(default = "default_bank_file")]
    pub bank_file: String,
    /// Student degrees file name, relative to `data_dir`.
    #[serde(default = "default_degrees_file")]
    pub degrees_file: String,
    /// Secret the data files are encrypted with. The built-in secret is
    /// used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Prefix added to phone numbers that lack it.
    #[serde(default = "default_phone_prefix")]
    pub phone_prefix: String,
}

impl std::fmt::Debug for QuizvaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizvaultConfig")
            .field("data_dir", &self.data_dir)
            .field("bank_file", &self.bank_file)
            .field("degrees_file", &self.degrees_file)
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .field("phone_prefix", &self.phone_prefix)
            .finish()
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./res/state")
}
fn default_bank_file() -> String {
    "tests.enc".to_string()
}
fn default_degrees_file() -> String {
    "degrees.enc".to_string()
}
fn default_phone_prefix() -> String {
    "+2".to_string()
}

impl Default for QuizvaultConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bank_file: default_bank_file(),
            degrees_file: default_degrees_file(),
            secret: None,
            phone_prefix: default_phone_prefix(),
        }
    }
}

impl QuizvaultConfig {
    pub fn bank_path(&self) -> PathBuf {
        self.data_dir.join(&self.bank_file)
    }

    pub fn degrees_path(&self) -> PathBuf {
        self.data_dir.join(&self.degrees_file)
    }

    pub fn envelope(&self) -> Envelope {
        match &self.secret {
            Some(secret) => Envelope::new(secret.as_bytes()),
            None => Envelope::legacy(),
        }
    }

    pub fn store(&self) -> RecordStore {
        RecordStore::new(self.bank_path(), self.degrees_path(), self.envelope())
    }

    /// Render as TOML, for writing a starter config file.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `QUIZVAULT_DATA_DIR` and `QUIZVAULT_SECRET` as found by `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("QUIZVAULT_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(secret) = lookup("QUIZVAULT_SECRET") {
            self.secret = Some(secret);
        }
    }

    /// Expand `${VAR}` references in the values read from the file.
    fn resolve_env_vars(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        self.data_dir =
            PathBuf::from(resolve_env_vars(&self.data_dir.to_string_lossy(), lookup));
        self.bank_file = resolve_env_vars(&self.bank_file, lookup);
        self.degrees_file = resolve_env_vars(&self.degrees_file, lookup);
        self.secret = self.secret.as_deref().map(|s| resolve_env_vars(s, lookup));
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables resolve to the empty string. Substituted values are
/// copied as they are and never expanded again.
fn resolve_env_vars(s: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        result.push_str(&lookup(&rest[start + 2..start + end]).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizvault.toml` in the current directory
/// 2. `~/.config/quizvault/config.toml`
///
/// Environment variable overrides: `QUIZVAULT_DATA_DIR`, `QUIZVAULT_SECRET`.
pub fn load_config() -> Result<QuizvaultConfig, ConfigError> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizvaultConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// `${VAR}` references are expanded in file values only; overrides are
/// taken verbatim.
fn load_config_with(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<QuizvaultConfig, ConfigError> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => return Err(ConfigError::NotFound(p.to_path_buf())),
        None => default_config_path(),
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            let config = toml::from_str::<QuizvaultConfig>(&content)
                .map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => QuizvaultConfig::default(),
    };

    config.resolve_env_vars(&lookup);
    config.apply_overrides(lookup);
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return Some(local);
    }
    let global = dirs_path()?.join("config.toml");
    global.exists().then_some(global)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizvault"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn resolve_env_vars_basic() {
        let lookup = vars(&[("GREETING", "hello")]);
        assert_eq!(resolve_env_vars("${GREETING}", &lookup), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${GREETING}_suffix", &lookup),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${MISSING}x", &lookup), "x");
        assert_eq!(resolve_env_vars("${unterminated", &lookup), "${unterminated");
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        let lookup = vars(&[("LOOP", "${LOOP}"), ("INNER", "a${LOOP}b")]);
        assert_eq!(resolve_env_vars("${LOOP}", &lookup), "${LOOP}");
        assert_eq!(resolve_env_vars("<${INNER}>", &lookup), "<a${LOOP}b>");
    }

    #[test]
    fn secret_override_is_taken_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizvault.toml");
        std::fs::write(
            &path,
            "data_dir = \"${EXAM_ROOT}/state\"\nsecret = \"${FILE_SECRET}\"\n",
        )
        .unwrap();

        let from_file = load_config_with(
            Some(&path),
            vars(&[("EXAM_ROOT", "/srv"), ("FILE_SECRET", "classroom")]),
        )
        .unwrap();
        assert_eq!(from_file.data_dir, PathBuf::from("/srv/state"));
        assert_eq!(from_file.secret.as_deref(), Some("classroom"));

        let overridden = load_config_with(
            Some(&path),
            vars(&[
                ("EXAM_ROOT", "/srv"),
                ("ss", "leaked"),
                ("QUIZVAULT_SECRET", "pa${ss}word"),
                ("QUIZVAULT_DATA_DIR", "/data/${ss}"),
            ]),
        )
        .unwrap();
        assert_eq!(overridden.secret.as_deref(), Some("pa${ss}word"));
        assert_eq!(overridden.data_dir, PathBuf::from("/data/${ss}"));
    }

    #[test]
    fn default_config() {
        let config = QuizvaultConfig::default();
        assert_eq!(config.bank_path(), PathBuf::from("./res/state/tests.enc"));
        assert_eq!(config.degrees_path(), PathBuf::from("./res/state/degrees.enc"));
        assert_eq!(config.phone_prefix, "+2");
        assert!(config.secret.is_none());
    }

    #[test]
    fn parse_partial_config() {
        let config: QuizvaultConfig = toml::from_str(
            r#"
data_dir = "/srv/exams"
secret = "classroom"
"#,
        )
        .unwrap();
        assert_eq!(config.bank_path(), PathBuf::from("/srv/exams/tests.enc"));
        assert_eq!(config.secret.as_deref(), Some("classroom"));
        assert_eq!(config.degrees_file, "degrees.enc");
    }

    #[test]
    fn env_overrides_win() {
        let mut config = QuizvaultConfig::default();
        config.apply_overrides(|key| match key {
            "QUIZVAULT_DATA_DIR" => Some("/tmp/quiz".into()),
            "QUIZVAULT_SECRET" => Some("s3cret".into()),
            _ => None,
        });
        assert_eq!(config.data_dir, PathBuf::from("/tmp/quiz"));
        assert_eq!(config.secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn debug_masks_secret() {
        let config = QuizvaultConfig {
            secret: Some("s3cret".into()),
            ..QuizvaultConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizvault.toml");
        let written = QuizvaultConfig {
            data_dir: dir.path().join("state"),
            ..QuizvaultConfig::default()
        };
        std::fs::write(&path, written.to_toml().unwrap()).unwrap();
        let loaded = load_config_from(Some(&path)).unwrap();
        // Only compare what the environment cannot override.
        assert_eq!(loaded.bank_file, written.bank_file);
        assert_eq!(loaded.phone_prefix, written.phone_prefix);

        let missing = load_config_from(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(missing, ConfigError::NotFound(_)));
    }

    #[test]
    fn malformed_config_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizvault.toml");
        std::fs::write(&path, "data_dir = [").unwrap();
        assert!(matches!(
            load_config_from(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }
}
