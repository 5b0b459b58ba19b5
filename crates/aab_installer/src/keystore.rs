//! Signing keystore configuration and its on-disk cache
//!
//! Credentials are cached per (bundle, keystore) pair in a pretty-printed
//! JSON array so repeated installs of the same bundle do not prompt again.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{InstallerError, Result};

/// Signing credentials for one keystore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystoreConfig {
    pub keystore: PathBuf,
    pub keystore_pass: String,
    pub keystore_alias: String,
    pub keystore_alias_password: String,
}

impl KeystoreConfig {
    pub fn new(keystore: impl Into<PathBuf>) -> Self {
        Self {
            keystore: keystore.into(),
            keystore_pass: String::new(),
            keystore_alias: String::new(),
            keystore_alias_password: String::new(),
        }
    }

    /// Persisted form of this config for `aab`
    pub fn to_record(&self, aab: &Path) -> Result<KeystoreRecord> {
        Ok(KeystoreRecord {
            aab_file_path: absolute_string(aab)?,
            keystore_path: absolute_string(&self.keystore)?,
            keystore_pass: self.keystore_pass.clone(),
            keystore_alias: self.keystore_alias.clone(),
            keystore_alias_password: self.keystore_alias_password.clone(),
        })
    }

    fn fill_from(&mut self, record: &KeystoreRecord) {
        self.keystore_pass = record.keystore_pass.clone();
        self.keystore_alias = record.keystore_alias.clone();
        self.keystore_alias_password = record.keystore_alias_password.clone();
    }
}

/// One cached entry, keyed by absolute bundle and keystore paths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeystoreRecord {
    pub aab_file_path: String,
    pub keystore_path: String,
    pub keystore_pass: String,
    pub keystore_alias: String,
    pub keystore_alias_password: String,
}

impl KeystoreRecord {
    fn matches(&self, aab: &str, keystore: &str) -> bool {
        self.aab_file_path == aab && self.keystore_path == keystore
    }
}

/// Source of credentials that are not cached yet
pub trait Prompter {
    fn prompt(&mut self, label: &str) -> Result<String>;
}

fn absolute_string(path: &Path) -> Result<String> {
    Ok(std::path::absolute(path)?.to_string_lossy().into_owned())
}

/// JSON-file backed cache of keystore credentials
#[derive(Debug, Clone)]
pub struct KeystoreStore {
    path: PathBuf,
}

impl KeystoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// All cached records; empty when the file is absent
    pub fn load(&self) -> Result<Vec<KeystoreRecord>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let json = std::fs::read_to_string(&self.path)?;
        let records: Option<Vec<KeystoreRecord>> = serde_json::from_str(&json)?;
        Ok(records.unwrap_or_default())
    }

    /// Cached record for the given bundle and keystore, if any
    pub fn find(&self, aab: &Path, keystore: &Path) -> Result<Option<KeystoreRecord>> {
        let aab = absolute_string(aab)?;
        let keystore = absolute_string(keystore)?;
        Ok(self
            .load()?
            .into_iter()
            .find(|record| record.matches(&aab, &keystore)))
    }

    /// Persist `config` for `aab` unless an entry for the same pair already exists
    pub fn save(&self, aab: &Path, config: &KeystoreConfig) -> Result<()> {
        let name = aab
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let record = config.to_record(aab)?;

        let records = if !self.exists() {
            info!("Saving keystore configuration for {} ..", name);
            vec![record]
        } else {
            info!("Updating keystore configuration for {} ..", name);
            let mut records = self.load()?;
            if records
                .iter()
                .any(|r| r.matches(&record.aab_file_path, &record.keystore_path))
            {
                return Ok(());
            }
            records.push(record);
            records
        };

        self.write(&records)
    }

    fn write(&self, records: &[KeystoreRecord]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(records)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| InstallerError::Io(e.error))?;
        Ok(())
    }

    /// Resolve credentials for `aab` signed with `keystore`.
    ///
    /// Returns the config and whether it came from the cache. Uncached
    /// credentials are collected through `prompter` but not saved here.
    pub fn lookup_or_prompt(
        &self,
        aab: &Path,
        keystore: &Path,
        prompter: &mut dyn Prompter,
    ) -> Result<(KeystoreConfig, bool)> {
        let mut config = KeystoreConfig::new(keystore);

        if !self.exists() {
            info!("Launch prompter ..");
            prompt_into(&mut config, aab, prompter)?;
            return Ok((config, false));
        }

        info!("Use existing configuration keystore ..");
        match self.find(aab, keystore)? {
            Some(record) => {
                config.fill_from(&record);
                Ok((config, true))
            }
            None => {
                info!("Keystore configuration not found in config file, launch prompter ..");
                prompt_into(&mut config, aab, prompter)?;
                Ok((config, false))
            }
        }
    }
}

fn prompt_into(config: &mut KeystoreConfig, aab: &Path, prompter: &mut dyn Prompter) -> Result<()> {
    info!("Setup config for {}:", aab.display());
    config.keystore_pass = prompter.prompt("Keystore password")?;
    config.keystore_alias = prompter.prompt("Keystore alias")?;
    config.keystore_alias_password = prompter.prompt("Keystore password for alias")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Answers prompts from a fixed list and records the labels asked
    struct ScriptedPrompter {
        answers: Vec<String>,
        asked: Vec<String>,
    }

    impl ScriptedPrompter {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().rev().map(|s| s.to_string()).collect(),
                asked: Vec::new(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn prompt(&mut self, label: &str) -> Result<String> {
            self.asked.push(label.to_string());
            Ok(self.answers.pop().unwrap_or_default())
        }
    }

    fn sample_config(keystore: &Path) -> KeystoreConfig {
        KeystoreConfig {
            keystore: keystore.to_path_buf(),
            keystore_pass: "storepass".to_string(),
            keystore_alias: "upload".to_string(),
            keystore_alias_password: "keypass".to_string(),
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = tempdir().unwrap();
        let store = KeystoreStore::new(temp_dir.path().join("config.json"));
        assert!(!store.exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_null_is_empty() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "null").unwrap();
        assert!(KeystoreStore::new(path).load().unwrap().is_empty());
    }

    #[test]
    fn test_record_uses_camel_case_keys() {
        let record = KeystoreRecord {
            aab_file_path: "/a/app.aab".to_string(),
            keystore_path: "/a/release.jks".to_string(),
            keystore_pass: "p".to_string(),
            keystore_alias: "alias".to_string(),
            keystore_alias_password: "ap".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["aabFilePath"], "/a/app.aab");
        assert_eq!(value["keystorePath"], "/a/release.jks");
        assert_eq!(value["keystorePass"], "p");
        assert_eq!(value["keystoreAlias"], "alias");
        assert_eq!(value["keystoreAliasPassword"], "ap");
    }

    #[test]
    fn test_record_missing_keys_default_to_empty() {
        let records: Vec<KeystoreRecord> =
            serde_json::from_str(r#"[{"aabFilePath": "/a/app.aab"}]"#).unwrap();
        assert_eq!(records[0].aab_file_path, "/a/app.aab");
        assert_eq!(records[0].keystore_pass, "");
    }

    #[test]
    fn test_save_then_find() {
        let temp_dir = tempdir().unwrap();
        let store = KeystoreStore::new(temp_dir.path().join("config.json"));
        let aab = temp_dir.path().join("app.aab");
        let keystore = temp_dir.path().join("release.jks");

        store.save(&aab, &sample_config(&keystore)).unwrap();

        let record = store.find(&aab, &keystore).unwrap().unwrap();
        assert_eq!(record.keystore_alias, "upload");
        assert_eq!(record.keystore_alias_password, "keypass");

        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert!(contents.trim_start().starts_with('['));
        assert!(contents.contains('\n'), "file should be pretty-printed");
    }

    #[test]
    fn test_find_requires_both_paths_to_match() {
        let temp_dir = tempdir().unwrap();
        let store = KeystoreStore::new(temp_dir.path().join("config.json"));
        let aab = temp_dir.path().join("app.aab");
        let keystore = temp_dir.path().join("release.jks");
        store.save(&aab, &sample_config(&keystore)).unwrap();

        let other_keystore = temp_dir.path().join("debug.keystore");
        let other_aab = temp_dir.path().join("other.aab");
        assert!(store.find(&aab, &other_keystore).unwrap().is_none());
        assert!(store.find(&other_aab, &keystore).unwrap().is_none());
    }

    #[test]
    fn test_save_appends_without_duplicates() {
        let temp_dir = tempdir().unwrap();
        let store = KeystoreStore::new(temp_dir.path().join("config.json"));
        let keystore = temp_dir.path().join("release.jks");
        let first = temp_dir.path().join("first.aab");
        let second = temp_dir.path().join("second.aab");

        store.save(&first, &sample_config(&keystore)).unwrap();
        store.save(&second, &sample_config(&keystore)).unwrap();

        let mut changed = sample_config(&keystore);
        changed.keystore_pass = "different".to_string();
        store.save(&first, &changed).unwrap();

        let records = store.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].keystore_pass, "storepass");
    }

    #[test]
    fn test_lookup_prompts_when_file_missing() {
        let temp_dir = tempdir().unwrap();
        let store = KeystoreStore::new(temp_dir.path().join("config.json"));
        let aab = temp_dir.path().join("app.aab");
        let keystore = temp_dir.path().join("release.jks");
        let mut prompter = ScriptedPrompter::new(&["sp", "alias", "ap"]);

        let (config, cached) = store
            .lookup_or_prompt(&aab, &keystore, &mut prompter)
            .unwrap();

        assert!(!cached);
        assert_eq!(config.keystore_pass, "sp");
        assert_eq!(config.keystore_alias, "alias");
        assert_eq!(config.keystore_alias_password, "ap");
        assert_eq!(
            prompter.asked,
            vec![
                "Keystore password",
                "Keystore alias",
                "Keystore password for alias"
            ]
        );
        assert!(!store.exists(), "lookup must not persist anything");
    }

    #[test]
    fn test_lookup_uses_cached_record() {
        let temp_dir = tempdir().unwrap();
        let store = KeystoreStore::new(temp_dir.path().join("config.json"));
        let aab = temp_dir.path().join("app.aab");
        let keystore = temp_dir.path().join("release.jks");
        store.save(&aab, &sample_config(&keystore)).unwrap();
        let mut prompter = ScriptedPrompter::new(&[]);

        let (config, cached) = store
            .lookup_or_prompt(&aab, &keystore, &mut prompter)
            .unwrap();

        assert!(cached);
        assert!(prompter.asked.is_empty());
        assert_eq!(config, sample_config(&keystore));
    }

    #[test]
    fn test_lookup_prompts_for_unknown_pair() {
        let temp_dir = tempdir().unwrap();
        let store = KeystoreStore::new(temp_dir.path().join("config.json"));
        let keystore = temp_dir.path().join("release.jks");
        store
            .save(&temp_dir.path().join("app.aab"), &sample_config(&keystore))
            .unwrap();
        let mut prompter = ScriptedPrompter::new(&["a", "b", "c"]);

        let (config, cached) = store
            .lookup_or_prompt(&temp_dir.path().join("new.aab"), &keystore, &mut prompter)
            .unwrap();

        assert!(!cached);
        assert_eq!(prompter.asked.len(), 3);
        assert_eq!(config.keystore_alias, "b");
    }
}
