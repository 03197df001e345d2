use crate::utils::errors::{ProviderError, Result};
use crate::vault::models::{CertificateBundle, KeyBundle, SecretBundle};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Where fetched vault objects come from.
///
/// `version` is empty when the latest version is wanted.
pub trait VaultObjectSource {
    fn get_secret(&self, name: &str, version: &str) -> Result<SecretBundle>;
    fn get_key(&self, name: &str, version: &str) -> Result<KeyBundle>;
    fn get_certificate(&self, name: &str, version: &str) -> Result<CertificateBundle>;
}

/// Vault objects stored as JSON bundles on disk.
///
/// Layout: `<root>/{secrets,keys,certificates}/<name>.json`, or
/// `<name>/<version>.json` for a pinned version.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ProviderError::Source(format!(
                "vault directory {} does not exist",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bundle_path(&self, collection: &str, name: &str, version: &str) -> PathBuf {
        let dir = self.root.join(collection);
        if version.is_empty() {
            dir.join(format!("{name}.json"))
        } else {
            dir.join(name).join(format!("{version}.json"))
        }
    }

    fn read_bundle<T: DeserializeOwned>(&self, collection: &str, name: &str, version: &str) -> Result<T> {
        let path = self.bundle_path(collection, name, version);
        tracing::debug!("reading {} bundle from {}", collection, path.display());

        let content = fs::read_to_string(&path).map_err(|e| {
            ProviderError::Source(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ProviderError::Source(format!("failed to parse {}: {e}", path.display()))
        })
    }
}

impl VaultObjectSource for DirectorySource {
    fn get_secret(&self, name: &str, version: &str) -> Result<SecretBundle> {
        self.read_bundle("secrets", name, version)
    }

    fn get_key(&self, name: &str, version: &str) -> Result<KeyBundle> {
        self.read_bundle("keys", name, version)
    }

    fn get_certificate(&self, name: &str, version: &str) -> Result<CertificateBundle> {
        self.read_bundle("certificates", name, version)
    }
}
