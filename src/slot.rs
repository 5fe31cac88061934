//! Slot I/O: mapping save objects to named files on a storage backend.
//!
//! A slot is a named save file. The extension is a pure function of the
//! compressed flag: `.csav` for zlib-compressed files, `.sav` for plain
//! ones. Slots live in the manager's save directory unless a custom path
//! is given; a custom path must already exist — a missing one makes every
//! operation report "no result" rather than fail hard.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::warn;

use crate::envelope::{self, VersionInfo};
use crate::types::{SAVE_OBJECT_TYPE, SaveError, SaveObject};

/// File extension for a slot, derived from the compressed flag.
pub fn slot_extension(compressed: bool) -> &'static str {
    if compressed { ".csav" } else { ".sav" }
}

/// Storage backend for slot files. Injected into [`SlotManager`], so the
/// whole slot layer can run against something other than the local
/// filesystem.
pub trait Storage: Send + Sync {
    fn read(&self, path: &Path) -> Result<Vec<u8>, SaveError>;
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), SaveError>;
    fn delete(&self, path: &Path) -> Result<(), SaveError>;
    /// File names (with extension) in `dir` ending with `extension`.
    fn list(&self, dir: &Path, extension: &str) -> Vec<String>;
    fn exists(&self, path: &Path) -> bool;
    fn dir_exists(&self, dir: &Path) -> bool;
    fn create_dir(&self, dir: &Path) -> Result<(), SaveError>;
}

/// Default backend over `std::fs`.
#[derive(Debug, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> Result<Vec<u8>, SaveError> {
        Ok(fs::read(path)?)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), SaveError> {
        Ok(fs::write(path, bytes)?)
    }

    fn delete(&self, path: &Path) -> Result<(), SaveError> {
        Ok(fs::remove_file(path)?)
    }

    fn list(&self, dir: &Path, extension: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| name.ends_with(extension))
            .collect()
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn dir_exists(&self, dir: &Path) -> bool {
        dir.is_dir()
    }

    fn create_dir(&self, dir: &Path) -> Result<(), SaveError> {
        Ok(fs::create_dir_all(dir)?)
    }
}

/// Handles save/load/enumeration of slot files in one directory.
#[derive(Clone)]
pub struct SlotManager {
    storage: Arc<dyn Storage>,
    save_directory: PathBuf,
}

impl SlotManager {
    /// Manager over the local filesystem. The save directory is created
    /// if it doesn't exist.
    pub fn new(save_directory: impl AsRef<Path>) -> Self {
        SlotManager::with_storage(Arc::new(FsStorage), save_directory)
    }

    pub fn with_storage(storage: Arc<dyn Storage>, save_directory: impl AsRef<Path>) -> Self {
        let save_directory = save_directory.as_ref().to_path_buf();
        if let Err(err) = storage.create_dir(&save_directory) {
            warn!("could not create save directory {}: {}", save_directory.display(), err);
        }
        SlotManager { storage, save_directory }
    }

    /// Default save directory under the user's data directory.
    pub fn default_directory() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("autosave")
            .join("saves")
    }

    pub fn save_directory(&self) -> &Path {
        &self.save_directory
    }

    /// Resolve the file path for a slot, or `None` for an empty slot name
    /// or a custom path that doesn't exist.
    fn slot_path(
        &self,
        slot_name: &str,
        compressed: bool,
        custom_path: Option<&Path>,
    ) -> Option<PathBuf> {
        if slot_name.is_empty() {
            return None;
        }
        let dir = self.resolve_dir(custom_path)?;
        Some(dir.join(format!("{}{}", slot_name, slot_extension(compressed))))
    }

    fn resolve_dir(&self, custom_path: Option<&Path>) -> Option<PathBuf> {
        match custom_path {
            Some(path) => {
                if !self.storage.dir_exists(path) {
                    warn!("custom save path {} doesn't exist", path.display());
                    return None;
                }
                Some(path.to_path_buf())
            }
            None => Some(self.save_directory.clone()),
        }
    }

    /// Serialize a save object into the versioned envelope (optionally
    /// compressed) and write it to the named slot. Returns false when the
    /// slot name is empty, the custom path is missing, or the write fails.
    pub fn save_to_slot(
        &self,
        save: &SaveObject,
        slot_name: &str,
        compressed: bool,
        custom_path: Option<&Path>,
    ) -> bool {
        let Some(path) = self.slot_path(slot_name, compressed, custom_path) else {
            return false;
        };
        match self.encode_slot(save, compressed) {
            Ok(bytes) => match self.storage.write(&path, &bytes) {
                Ok(()) => true,
                Err(err) => {
                    warn!("could not write slot '{}': {}", slot_name, err);
                    false
                }
            },
            Err(err) => {
                warn!("could not encode slot '{}': {}", slot_name, err);
                false
            }
        }
    }

    fn encode_slot(&self, save: &SaveObject, compressed: bool) -> Result<Vec<u8>, SaveError> {
        let payload = save.to_bytes()?;
        let bytes = envelope::encode(&payload, &VersionInfo::current(), SAVE_OBJECT_TYPE);
        if compressed { envelope::compress(&bytes) } else { Ok(bytes) }
    }

    /// Read and decode the named slot. `None` for a missing slot, a
    /// missing custom path, or a file that doesn't decode into a save
    /// object.
    pub fn load_from_slot(
        &self,
        slot_name: &str,
        compressed: bool,
        custom_path: Option<&Path>,
    ) -> Option<SaveObject> {
        let path = self.slot_path(slot_name, compressed, custom_path)?;
        let bytes = self.storage.read(&path).ok()?;
        match self.decode_slot(&bytes, compressed) {
            Ok(save) => Some(save),
            Err(err) => {
                warn!("could not decode slot '{}': {}", slot_name, err);
                None
            }
        }
    }

    fn decode_slot(&self, bytes: &[u8], compressed: bool) -> Result<SaveObject, SaveError> {
        let bytes = if compressed {
            envelope::decompress(bytes)?
        } else {
            bytes.to_vec()
        };
        let container = envelope::decode(&bytes)?;
        if container.root_type != SAVE_OBJECT_TYPE {
            return Err(SaveError::UnknownRootType(container.root_type));
        }
        SaveObject::from_bytes(&container.payload)
    }

    pub fn slot_exists(
        &self,
        slot_name: &str,
        compressed: bool,
        custom_path: Option<&Path>,
    ) -> bool {
        match self.slot_path(slot_name, compressed, custom_path) {
            Some(path) => self.storage.exists(&path),
            None => false,
        }
    }

    pub fn delete_slot(
        &self,
        slot_name: &str,
        compressed: bool,
        custom_path: Option<&Path>,
    ) -> bool {
        match self.slot_path(slot_name, compressed, custom_path) {
            Some(path) => self.storage.delete(&path).is_ok(),
            None => false,
        }
    }

    /// Slot names (extension stripped) present in the directory, for the
    /// given compression flavor.
    pub fn list_slots(&self, compressed: bool, custom_path: Option<&Path>) -> Vec<String> {
        let Some(dir) = self.resolve_dir(custom_path) else {
            return Vec::new();
        };
        let extension = slot_extension(compressed);
        let mut names: Vec<String> = self
            .storage
            .list(&dir, extension)
            .into_iter()
            .filter_map(|name| name.strip_suffix(extension).map(str::to_string))
            .collect();
        names.sort();
        names
    }
}
