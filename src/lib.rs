//! Opt-in, declarative save/load for scene actors
//!
//! Actors join the save system by carrying an [`AutoSaveMarker`]; nothing
//! is saved or touched without one. A capture pass walks the marked
//! actors of the requested levels into a portable [`SaveObject`]; a load
//! pass reconciles a save object back against the live scene, matching
//! actors by name, respawning missing ones and disposing of orphans per
//! their marker's policy. Slot I/O wraps the whole object in a versioned
//! binary envelope, optionally zlib-compressed.
//!
//! # Architecture
//!
//! - `types`: record model and error type
//! - `scene`: engine-facing traits (`Actor`, `Component`, `World`)
//! - `marker`: the opt-in marker and the event sink
//! - `capture`: save orchestration
//! - `restore`: load/reconciliation
//! - `envelope`: versioned binary container + compression
//! - `slot`: named save files on a storage backend
//! - `task`: background slot I/O
//!
//! # Example Usage
//!
//! ```ignore
//! let levels = collect_levels(&world, &["/game/level1"]);
//! let mut save = SaveObject::new();
//! capture_levels(&mut save, &mut world, &levels, &mut NullSink);
//!
//! let manager = SlotManager::new(SlotManager::default_directory());
//! manager.save_to_slot(&save, "slot1", true, None);
//!
//! if let Some(loaded) = manager.load_from_slot("slot1", true, None) {
//!     let levels = collect_levels(&world, &["/game/level1"]);
//!     apply_levels(&loaded, &mut world, &levels, ReconcilePolicy::default(), &mut NullSink);
//! }
//! ```

pub mod capture;
pub mod envelope;
pub mod marker;
pub mod restore;
pub mod scene;
pub mod slot;
pub mod task;
pub mod types;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use capture::{capture_actor, capture_levels};
pub use marker::{AutoSaveMarker, EventSink, NullSink, SaveEvent};
pub use restore::{ReconcilePolicy, apply_levels, apply_record};
pub use scene::{
    Actor, ActorHandle, Component, LevelWithActors, ObjectRef, SaveFields, SpawnId, World,
    collect_levels,
};
pub use slot::{SlotManager, Storage};
pub use task::{load_from_slot_async, save_to_slot_async};
pub use types::{SaveError, SaveObject};
