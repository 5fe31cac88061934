//! Trait seams between the save system and the host engine.
//!
//! The core never owns actors or components; it walks them through these
//! traits. A host engine (or the in-memory test world) implements
//! [`Actor`], [`Component`] and [`World`], and opts concrete components
//! into spatial/physics capture through [`Spatial`] and [`Physical`].

use serde::{Deserialize, Serialize};

use crate::marker::AutoSaveMarker;
use crate::types::{Rotator, SaveError, Transform, Vec3};

/// Field-level serialization seam.
///
/// Implementors convert their save-relevant fields to and from an opaque
/// byte buffer. References to other in-scene objects must be stored as
/// portable name strings (see [`ObjectRef`]), never as handles; on apply,
/// a reference that no longer resolves is left at its current value
/// rather than reported as an error.
pub trait SaveFields {
    /// Serialize the save-relevant fields into a byte buffer.
    fn capture_fields(&self) -> Result<Vec<u8>, SaveError>;

    /// Restore the save-relevant fields from a byte buffer.
    fn apply_fields(&mut self, bytes: &[u8]) -> Result<(), SaveError>;
}

/// Encode a serde-serializable field struct into capture bytes.
pub fn encode_fields<T: Serialize>(fields: &T) -> Result<Vec<u8>, SaveError> {
    let bytes = bincode::serde::encode_to_vec(fields, bincode::config::standard())?;
    Ok(bytes)
}

/// Decode capture bytes back into a field struct.
pub fn decode_fields<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, SaveError> {
    let (fields, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(fields)
}

/// A portable reference to another in-scene actor, stored by name so the
/// capture bytes never contain session-local handles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRef {
    pub path: String,
}

impl ObjectRef {
    pub fn to_actor(actor: &dyn Actor) -> Self {
        ObjectRef { path: actor.name().to_string() }
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Resolve the reference against the live world. `None` when no actor
    /// carries this name anymore; callers keep their current value then.
    pub fn resolve(&self, world: &dyn World) -> Option<ActorHandle> {
        if self.path.is_empty() {
            return None;
        }
        world
            .handles()
            .into_iter()
            .find(|handle| world.actor(*handle).is_some_and(|a| a.name() == self.path))
    }
}

/// Capability seam for components that carry a local transform.
pub trait Spatial {
    fn local_location(&self) -> Vec3;
    fn set_local_location(&mut self, location: Vec3);
    fn local_rotation(&self) -> Rotator;
    fn set_local_rotation(&mut self, rotation: Rotator);
    fn local_scale(&self) -> Vec3;
    fn set_local_scale(&mut self, scale: Vec3);
}

/// Capability seam for components backed by a physics body.
pub trait Physical {
    fn linear_velocity(&self) -> Vec3;
    fn set_linear_velocity(&mut self, velocity: Vec3);
    fn angular_velocity(&self) -> Vec3;
    fn set_angular_velocity(&mut self, velocity: Vec3);
}

/// A behavior/data unit attached to an actor.
pub trait Component: SaveFields {
    /// Identity key within the owning actor.
    fn name(&self) -> &str;

    /// Spatial capability, if this component has a local transform.
    fn as_spatial(&mut self) -> Option<&mut dyn Spatial> {
        None
    }

    /// Physics capability, if this component has a simulated body.
    fn as_physical(&mut self) -> Option<&mut dyn Physical> {
        None
    }

    /// Storer-class components opt into wholesale self-serialization:
    /// their fields are always captured and spatial/physics capture is
    /// skipped for them.
    fn is_storer(&self) -> bool {
        false
    }
}

/// A placeable object instance in a scene.
pub trait Actor: SaveFields {
    /// Identity key, unique within a level at a point in time.
    fn name(&self) -> &str;

    /// Class identifier used to respawn this actor from a record.
    fn class_id(&self) -> &str;

    /// Path-qualified name of the level this actor belongs to.
    fn level_name(&self) -> &str;

    fn transform(&self) -> Transform;
    fn set_transform(&mut self, transform: Transform);

    /// The marker component opting this actor into the save system, if
    /// attached.
    fn marker(&self) -> Option<&AutoSaveMarker>;
    fn marker_mut(&mut self) -> Option<&mut AutoSaveMarker>;

    /// All non-marker components, in discovery order. The order is not
    /// guaranteed stable across captures.
    fn components_mut(&mut self) -> Vec<&mut dyn Component>;
}

/// Opaque identity of a live actor inside its [`World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorHandle(pub u64);

/// Identity policy for a spawned actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnId {
    /// Spawn under the recorded name.
    Keep(String),
    /// Let the engine assign a fresh random identity.
    Random,
}

/// Actor lifetime collaborator: enumeration, spawning, destruction and
/// the unreachable-object sweep after a load pass.
pub trait World {
    /// Every live actor, in world enumeration order.
    fn handles(&self) -> Vec<ActorHandle>;

    fn actor(&self, handle: ActorHandle) -> Option<&dyn Actor>;
    fn actor_mut(&mut self, handle: ActorHandle) -> Option<&mut dyn Actor>;

    /// Spawn an actor of `class_id` at `transform` into the named level.
    /// Returns `None` when the class identifier cannot be resolved; no
    /// partial actor is created in that case.
    fn spawn(
        &mut self,
        class_id: &str,
        transform: Transform,
        id: SpawnId,
        level_name: &str,
    ) -> Option<ActorHandle>;

    fn destroy(&mut self, handle: ActorHandle);

    /// Force a full unreachable-object sweep. Called once at the end of a
    /// load pass, since many actors may have been destroyed.
    fn sweep(&mut self) {}
}

/// Transient pairing of a live actor with the fact that it carries a
/// marker. Built per save/load call, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveActor {
    pub handle: ActorHandle,
}

/// One level's worth of save-system candidates for a single pass.
#[derive(Debug, Clone)]
pub struct LevelWithActors {
    /// Path-qualified level name.
    pub name: String,
    pub actors: Vec<LiveActor>,
}

impl LevelWithActors {
    pub fn empty(name: impl Into<String>) -> Self {
        LevelWithActors { name: name.into(), actors: Vec::new() }
    }
}

/// Walk the world once and bucket every marked actor into the requested
/// levels. Actors without a marker, and actors in levels not named here,
/// are excluded. Returns one entry per requested level, in request order.
pub fn collect_levels(world: &dyn World, level_names: &[&str]) -> Vec<LevelWithActors> {
    let mut levels: Vec<LevelWithActors> =
        level_names.iter().map(|name| LevelWithActors::empty(*name)).collect();
    if levels.is_empty() {
        return levels;
    }

    for handle in world.handles() {
        let Some(actor) = world.actor(handle) else { continue };
        if actor.marker().is_none() {
            continue;
        }
        let actor_level = actor.level_name();
        if let Some(level) = levels.iter_mut().find(|level| level.name == actor_level) {
            level.actors.push(LiveActor { handle });
        }
    }
    levels
}

/// Total number of candidate actors across all levels.
pub fn actor_count(levels: &[LevelWithActors]) -> usize {
    levels.iter().map(|level| level.actors.len()).sum()
}
