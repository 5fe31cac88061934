//! Background slot I/O.
//!
//! Disk work for a slot runs on its own thread; the caller hands in a
//! callback that is invoked exactly once with the outcome. Scene capture
//! and restore stay on the caller's thread — only serialization and file
//! I/O move off it.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crate::slot::SlotManager;
use crate::types::SaveObject;

/// Write `save` to the named slot on a background thread. The callback
/// receives the same success flag [`SlotManager::save_to_slot`] returns.
pub fn save_to_slot_async<F>(
    manager: SlotManager,
    save: SaveObject,
    slot_name: String,
    compressed: bool,
    custom_path: Option<PathBuf>,
    on_done: F,
) -> JoinHandle<()>
where
    F: FnOnce(bool) + Send + 'static,
{
    thread::spawn(move || {
        let ok = manager.save_to_slot(&save, &slot_name, compressed, custom_path.as_deref());
        on_done(ok);
    })
}

/// Read the named slot on a background thread. The callback receives the
/// decoded save object, or `None` on any failure, exactly as
/// [`SlotManager::load_from_slot`] reports it.
pub fn load_from_slot_async<F>(
    manager: SlotManager,
    slot_name: String,
    compressed: bool,
    custom_path: Option<PathBuf>,
    on_done: F,
) -> JoinHandle<()>
where
    F: FnOnce(Option<SaveObject>) + Send + 'static,
{
    thread::spawn(move || {
        let save = manager.load_from_slot(&slot_name, compressed, custom_path.as_deref());
        on_done(save);
    })
}
