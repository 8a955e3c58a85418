use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::workflow::CategoryPolicy;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CategoryLabels {
    pub consolidated_invoice: Option<String>,
    pub separate_invoice: Option<String>,
    #[serde(alias = "daching_relationship")]
    pub related_enterprise: Option<String>,
}

impl CategoryLabels {
    /// Labels left unset fall back to the service defaults.
    pub fn into_policy(self) -> CategoryPolicy {
        let defaults = CategoryPolicy::default();
        let pick = |v: Option<String>, d: String| match v {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => d,
        };
        CategoryPolicy {
            consolidated_invoice: pick(self.consolidated_invoice, defaults.consolidated_invoice),
            separate_invoice: pick(self.separate_invoice, defaults.separate_invoice),
            related_enterprise: pick(self.related_enterprise, defaults.related_enterprise),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    #[serde(alias = "backend_url")]
    pub base_url: Option<String>,
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    pub no_color: Option<bool>,
    pub page_size: Option<usize>,
    pub lang: Option<String>,
    pub categories: Option<CategoryLabels>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".custid").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_yaml::from_str::<Option<ConfigFile>>(&contents)
            .map(Option::unwrap_or_default)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# custid config
#
# Location (default):
#   ~/.custid/config.yml

# Service
base_url: http://127.0.0.1:8000/
timeout: 10
# proxy: http://127.0.0.1:8080

# Output
page_size: 10
no_color: false
# en or zh-TW
lang: en

# Category labels that switch on the chain/branch fields.
# Leave unset to use the labels the service ships with.
# categories:
#   consolidated_invoice: 連鎖或相關企業的合開發票
#   separate_invoice: 連鎖或相關企業的不合開發票
#   related_enterprise: 達清關係企業
"#
    .to_string()
}

/// Writes the commented default config unless a file already exists.
/// Returns whether a file was written.
pub fn ensure_default_config_file(path: &PathBuf) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}
