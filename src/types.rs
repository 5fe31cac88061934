//! Record model for the auto save/load system.
//!
//! This module defines the nested record structure a save file is built
//! from (save object → map record → actor record → component record),
//! the per-component override options, the math types captured alongside
//! them, and the error type shared across the crate.

use serde::{Deserialize, Serialize};

/// A point or direction in world/local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Vec3 = Vec3 { x: 1.0, y: 1.0, z: 1.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Vec3::ZERO
    }
}

/// An orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Rotator { pitch, yaw, roll }
    }
}

/// A world transform: location, rotation and scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub location: Vec3,
    pub rotation: Rotator,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            location: Vec3::ZERO,
            rotation: Rotator::default(),
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_location(location: Vec3) -> Self {
        Transform { location, ..Transform::default() }
    }
}

/// Per-component override of the actor-level save defaults.
///
/// An option matches a component by exact name equality. An empty name is
/// the "no override" sentinel and never matches anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentOverrideOption {
    /// Name of the component this option customizes.
    pub name: String,
    /// If false, the named component is excluded from capture entirely.
    pub save: bool,
    pub save_location: bool,
    pub save_rotation: bool,
    pub save_scale: bool,
    pub save_linear_velocity: bool,
    pub save_angular_velocity: bool,
}

impl Default for ComponentOverrideOption {
    fn default() -> Self {
        ComponentOverrideOption {
            name: String::new(),
            save: true,
            save_location: true,
            save_rotation: true,
            save_scale: true,
            save_linear_velocity: true,
            save_angular_velocity: true,
        }
    }
}

impl ComponentOverrideOption {
    /// An override that excludes the named component from capture.
    pub fn skip(name: impl Into<String>) -> Self {
        ComponentOverrideOption {
            name: name.into(),
            save: false,
            ..ComponentOverrideOption::default()
        }
    }

    pub fn is_override_for(&self, component_name: &str) -> bool {
        !self.name.is_empty() && self.name == component_name
    }
}

/// One component's captured state.
///
/// The spatial and physics fields are `Some` only if the corresponding
/// flag (override or actor default) was true at capture time. Absence
/// means "not authoritative, do not touch on load".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Identity key: the component's name on its actor.
    pub name: String,
    /// Opaque save-relevant field data, as produced by the component.
    pub data: Vec<u8>,
    pub location: Option<Vec3>,
    pub rotation: Option<Rotator>,
    pub scale: Option<Vec3>,
    pub linear_velocity: Option<Vec3>,
    pub angular_velocity: Option<Vec3>,
}

/// One actor's captured state, including its component records in
/// discovery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorRecord {
    /// Identity key: unique within a level at capture time.
    pub name: String,
    /// Class identifier used to respawn the actor if it is missing on load.
    pub class_id: String,
    pub transform: Transform,
    /// Respawn with a fresh random identity instead of the original name.
    pub load_random_id: bool,
    /// Opaque save-relevant field data for the actor itself.
    pub data: Vec<u8>,
    pub components: Vec<ComponentRecord>,
}

/// One level's captured state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapRecord {
    /// Path-qualified level name.
    pub name: String,
    pub actors: Vec<ActorRecord>,
}

/// The root persisted value: every captured level, in capture order.
///
/// Created empty by the caller, populated additively by repeated capture
/// calls, serialized for persistence and consumed during load. At most one
/// map record exists per level name; capturing a level again replaces its
/// record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveObject {
    pub maps: Vec<MapRecord>,
}

/// Root type identifier written into the file envelope.
pub const SAVE_OBJECT_TYPE: &str = "AutoSaveObject";

impl SaveObject {
    pub fn new() -> Self {
        SaveObject::default()
    }

    /// True if at least one level has been captured into this object.
    pub fn contains_save_data(&self) -> bool {
        !self.maps.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.maps.len()
    }

    pub fn actor_count_in_level(&self, index: usize) -> usize {
        self.maps.get(index).map_or(0, |map| map.actors.len())
    }

    pub fn total_actor_count(&self) -> usize {
        self.maps.iter().map(|map| map.actors.len()).sum()
    }

    pub fn find_map(&self, level_name: &str) -> Option<usize> {
        self.maps.iter().position(|map| map.name == level_name)
    }

    /// Remove the map record for a level, if present. Returns whether a
    /// record was removed.
    pub fn remove_map(&mut self, level_name: &str) -> bool {
        match self.find_map(level_name) {
            Some(index) => {
                self.maps.remove(index);
                true
            }
            None => false,
        }
    }

    /// Serialize the record tree into the envelope payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SaveError> {
        let bytes = bincode::serde::encode_to_vec(self, bincode::config::standard())?;
        Ok(bytes)
    }

    /// Deserialize a record tree from an envelope payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<SaveObject, SaveError> {
        let (save, _) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(save)
    }
}

/// Error type for save/load operations.
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Encode(bincode::error::EncodeError),
    Decode(bincode::error::DecodeError),
    Corrupted(String),
    UnknownRootType(String),
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Encode(e) => write!(f, "Serialization error: {}", e),
            SaveError::Decode(e) => write!(f, "Deserialization error: {}", e),
            SaveError::Corrupted(msg) => write!(f, "Corrupted save data: {}", msg),
            SaveError::UnknownRootType(name) => {
                write!(f, "Save file holds unexpected root type '{}'", name)
            }
        }
    }
}

impl std::error::Error for SaveError {}

impl From<std::io::Error> for SaveError {
    fn from(err: std::io::Error) -> Self {
        SaveError::Io(err)
    }
}

impl From<bincode::error::EncodeError> for SaveError {
    fn from(err: bincode::error::EncodeError) -> Self {
        SaveError::Encode(err)
    }
}

impl From<bincode::error::DecodeError> for SaveError {
    fn from(err: bincode::error::DecodeError) -> Self {
        SaveError::Decode(err)
    }
}
