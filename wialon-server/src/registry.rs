//! File-backed IMEI → credential registry.
//!
//! Mirrors [`wialon_core::BlackBox`]'s posture on its disk file: a missing
//! file is an empty registry, not an error, and every mutation rewrites the
//! whole file via write-temp-then-rename.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use wialon_core::StorageError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCredentials {
    pub password: String,
}

/// On-disk shape: a flat array of `{imei, password}` records.
#[derive(Debug, Serialize, Deserialize)]
struct DeviceRecord {
    imei: String,
    password: String,
}

pub struct DeviceRegistry {
    path: PathBuf,
    devices: HashMap<String, DeviceCredentials>,
}

impl DeviceRegistry {
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let devices = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Vec<DeviceRecord>>(&bytes)
                .map(|records| {
                    records.into_iter().map(|r| (r.imei, DeviceCredentials { password: r.password })).collect()
                })
                .unwrap_or_else(|e| {
                    warn!(error = %e, path = %path.display(), "corrupt device registry, starting empty");
                    HashMap::new()
                }),
            Err(e) => {
                debug!(error = %e, path = %path.display(), "no device registry file, starting empty");
                HashMap::new()
            }
        };
        Self { path, devices }
    }

    /// `Some(true)` authenticated, `Some(false)` wrong password, `None`
    /// unknown IMEI.
    pub fn authenticate(&self, imei: &str, password: &str) -> Option<bool> {
        self.devices.get(imei).map(|creds| creds.password == password)
    }

    pub fn lookup(&self, imei: &str) -> Option<&DeviceCredentials> {
        self.devices.get(imei)
    }

    pub fn register(&mut self, imei: &str, password: &str) -> Result<(), StorageError> {
        self.devices.insert(imei.to_string(), DeviceCredentials { password: password.to_string() });
        self.persist()
    }

    pub fn unregister(&mut self, imei: &str) -> Result<(), StorageError> {
        self.devices.remove(imei);
        self.persist()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn persist(&self) -> Result<(), StorageError> {
        let records: Vec<DeviceRecord> = self
            .devices
            .iter()
            .map(|(imei, creds)| DeviceRecord { imei: imei.clone(), password: creds.password.clone() })
            .collect();
        let json = serde_json::to_vec(&records).map_err(StorageError::Parse)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &json).map_err(StorageError::Write)?;
        fs::rename(&tmp, &self.path).map_err(StorageError::Write)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("wialon-registry-test-{name}-{}.json", std::process::id()))
    }

    #[test]
    fn missing_file_is_empty_registry() {
        let path = temp_path("missing");
        let _ = fs::remove_file(&path);
        let registry = DeviceRegistry::load(&path);
        assert!(registry.is_empty());
        assert_eq!(registry.authenticate("wips", "wips"), None);
    }

    #[test]
    fn register_then_authenticate_round_trips() {
        let path = temp_path("auth");
        let _ = fs::remove_file(&path);
        let mut registry = DeviceRegistry::load(&path);
        registry.register("123456789012345", "secret").unwrap();

        assert_eq!(registry.authenticate("123456789012345", "secret"), Some(true));
        assert_eq!(registry.authenticate("123456789012345", "wrong"), Some(false));

        let reloaded = DeviceRegistry::load(&path);
        assert_eq!(reloaded.authenticate("123456789012345", "secret"), Some(true));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn unregister_removes_device() {
        let path = temp_path("unregister");
        let _ = fs::remove_file(&path);
        let mut registry = DeviceRegistry::load(&path);
        registry.register("111", "pw").unwrap();
        registry.unregister("111").unwrap();
        assert_eq!(registry.authenticate("111", "pw"), None);
        let _ = fs::remove_file(&path);
    }
}
