//! The marker component that opts an actor into the save system.
//!
//! Attaching an [`AutoSaveMarker`] to an actor is the whole opt-in story:
//! the capture and load passes only ever look at actors whose marker is
//! present and enabled. The marker also carries the actor-level component
//! defaults and the per-component override list, and its own state rides
//! inside the save file so load-time policy matches save-time policy.

use serde::{Deserialize, Serialize};

use crate::scene::{Actor, SaveFields, decode_fields, encode_fields};
use crate::types::{ComponentOverrideOption, SaveError};

/// Marker component holding per-actor save/load policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoSaveMarker {
    /// Component identity; the marker's own record is matched by it.
    pub name: String,
    /// If false, the owner actor is neither saved nor loaded.
    pub enabled: bool,
    /// Set when the owner actor is captured into a save object. The orphan
    /// sweep on load uses it to tell "never saved" from "saved elsewhere".
    pub was_saved: bool,
    /// Destroy the owner on load if it has no matching record. Off by
    /// default so placed actors survive level design iteration; flip it at
    /// runtime for spawned actors.
    pub destroy_on_load_if_unsaved: bool,
    /// Respawn the owner under a fresh random identity instead of the
    /// recorded name.
    pub load_with_random_id: bool,
    /// Capture components at all when no override says otherwise.
    pub save_components: bool,
    pub save_locations: bool,
    pub save_rotations: bool,
    pub save_scales: bool,
    pub save_linear_velocities: bool,
    pub save_angular_velocities: bool,
    /// Per-component overrides of the defaults above.
    pub overrides: Vec<ComponentOverrideOption>,
}

impl Default for AutoSaveMarker {
    fn default() -> Self {
        AutoSaveMarker {
            name: "autosave".to_string(),
            enabled: true,
            was_saved: false,
            destroy_on_load_if_unsaved: false,
            load_with_random_id: false,
            save_components: false,
            save_locations: true,
            save_rotations: true,
            save_scales: true,
            save_linear_velocities: true,
            save_angular_velocities: true,
            overrides: Vec::new(),
        }
    }
}

impl AutoSaveMarker {
    pub fn new() -> Self {
        AutoSaveMarker::default()
    }

    /// Marker that captures every component with the default flags.
    pub fn saving_components() -> Self {
        AutoSaveMarker { save_components: true, ..AutoSaveMarker::default() }
    }

    /// Find the override option for a component, by exact name equality.
    /// Empty-name options are the "no override" sentinel and never match.
    pub fn find_override(&self, component_name: &str) -> Option<&ComponentOverrideOption> {
        self.overrides.iter().find(|option| option.is_override_for(component_name))
    }
}

impl SaveFields for AutoSaveMarker {
    fn capture_fields(&self) -> Result<Vec<u8>, SaveError> {
        encode_fields(self)
    }

    fn apply_fields(&mut self, bytes: &[u8]) -> Result<(), SaveError> {
        *self = decode_fields(bytes)?;
        Ok(())
    }
}

/// Lifecycle events fired synchronously around each actor during a save
/// or load pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveEvent {
    /// Before the actor is captured. Field changes made here are saved.
    SaveBegin,
    /// After the actor's record was appended to the save object.
    SaveEnd,
    /// Before any recorded data is applied to the actor.
    LoadBegin,
    /// After the actor and its components carry the recorded values.
    LoadEnd,
    /// The actor has no record and is about to be destroyed. The handler
    /// may veto by clearing `destroy_on_load_if_unsaved`; the flag is
    /// re-checked after the event.
    DestroyUnsaved,
    /// The actor has no record and is left untouched.
    Unchanged,
}

/// Caller-supplied sink for lifecycle events. Invoked on the thread
/// running the pass, before the next record is processed.
pub trait EventSink {
    fn handle(&mut self, event: SaveEvent, actor: &mut dyn Actor);
}

/// Sink that ignores every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn handle(&mut self, _event: SaveEvent, _actor: &mut dyn Actor) {}
}
