use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

const STAFF_SNAPSHOT_FILE: &str = "staff_snapshot.json";
const OFFLINE_QUEUE_FILE: &str = "offline_queue.json";
const DEVICE_FILE: &str = "device.json";

/// JSON-file key-value storage for the device: the roster snapshot, the
/// offline punch queue and the sticky branch selection. Writes are
/// synchronous and go through one mutex, so a reader can never observe a
/// half-written value.
pub struct LocalStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create data dir {}", root.display()))?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>> {
        let path = self.root.join(file);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value = serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt local file {}", path.display()))?;
        Ok(Some(value))
    }

    // Write to a temp file then rename, so a crash mid-write leaves the old
    // value intact.
    fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let path = self.root.join(file);
        let tmp = self.root.join(format!("{file}.tmp"));
        let raw = serde_json::to_string_pretty(value)?;
        fs::write(&tmp, raw).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, file: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let path = self.root.join(file);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }

    /// Last successfully refreshed roster snapshot.
    pub fn read_staff_snapshot(&self) -> Result<Option<Vec<crate::model::staff::StaffCredential>>> {
        self.read(STAFF_SNAPSHOT_FILE)
    }

    /// Replaces the whole snapshot; entries are never invalidated one by one.
    pub fn write_staff_snapshot(&self, staff: &[crate::model::staff::StaffCredential]) -> Result<()> {
        self.write(STAFF_SNAPSHOT_FILE, &staff)
    }

    pub fn read_queue(&self) -> Result<Vec<crate::model::attendance::QueuedPunch>> {
        Ok(self.read(OFFLINE_QUEUE_FILE)?.unwrap_or_default())
    }

    pub fn write_queue(&self, queue: &[crate::model::attendance::QueuedPunch]) -> Result<()> {
        self.write(OFFLINE_QUEUE_FILE, &queue)
    }

    /// Sticky branch selection for this device.
    pub fn read_saved_branch(&self) -> Result<Option<String>> {
        self.read(DEVICE_FILE)
    }

    pub fn write_saved_branch(&self, branch_id: &str) -> Result<()> {
        self.write(DEVICE_FILE, &branch_id)
    }

    pub fn clear_saved_branch(&self) -> Result<()> {
        self.remove(DEVICE_FILE)
    }
}

#[cfg(test)]
pub(crate) fn temp_store() -> LocalStore {
    let dir = std::env::temp_dir().join(format!("timeclock-test-{}", uuid::Uuid::new_v4()));
    LocalStore::open(dir).unwrap()
}
