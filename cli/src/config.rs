use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

use nosh_core::NutritionPolicy;

/// Relocates the data directory (journal) when set.
pub const DATA_DIR_ENV: &str = "NOSH_DATA_DIR";

pub struct Config {
    pub data_dir: PathBuf,
    pub journal_path: PathBuf,
    pub policy_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "nosh").context("Could not determine home directory")?;

        let data_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => proj_dirs.data_dir().to_path_buf(),
        };
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let journal_path = data_dir.join("journal.json");
        let policy_path = proj_dirs.config_dir().join("policy.json");

        Ok(Config {
            data_dir,
            journal_path,
            policy_path,
        })
    }

    /// The nutrition policy from `policy.json`, or the defaults when the file
    /// does not exist. Missing fields fall back to their defaults.
    pub fn load_policy(&self) -> Result<NutritionPolicy> {
        load_policy_from(&self.policy_path)
    }
}

pub(crate) fn load_policy_from(path: &std::path::Path) -> Result<NutritionPolicy> {
    if !path.exists() {
        return Ok(NutritionPolicy::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read policy file: {}", path.display()))?;
    let policy: NutritionPolicy = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse policy file: {}", path.display()))?;
    policy
        .validate()
        .with_context(|| format!("Invalid policy in {}", path.display()))?;
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_policy_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let policy = load_policy_from(&dir.path().join("policy.json")).unwrap();
        assert_eq!(policy, NutritionPolicy::default());
    }

    #[test]
    fn test_partial_policy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, r#"{ "deficit_kcal": 750 }"#).unwrap();
        let policy = load_policy_from(&path).unwrap();
        assert!((policy.deficit_kcal - 750.0).abs() < f64::EPSILON);
        assert!((policy.surplus_kcal - NutritionPolicy::default().surplus_kcal).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_policy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, r#"{ "fat_energy_fraction": 1.2 }"#).unwrap();
        let err = load_policy_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid policy"));

        std::fs::write(&path, "not json").unwrap();
        assert!(load_policy_from(&path).is_err());
    }
}
