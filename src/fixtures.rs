//! In-memory scene used by the unit tests: a tiny world of actors and
//! components implementing the engine-facing traits, plus event sinks
//! that record or veto what the save system does.

use serde::{Deserialize, Serialize};

use crate::marker::{AutoSaveMarker, EventSink, SaveEvent};
use crate::scene::{
    Actor, ActorHandle, Component, Physical, SaveFields, Spatial, SpawnId, World,
    decode_fields, encode_fields,
};
use crate::types::{Rotator, SaveError, Transform, Vec3};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorFields {
    pub health: f32,
}

pub struct TestActor {
    pub name: String,
    pub class_id: String,
    pub level: String,
    pub transform: Transform,
    pub marker: Option<AutoSaveMarker>,
    pub components: Vec<TestComponent>,
    pub fields: ActorFields,
}

impl TestActor {
    pub fn new(name: &str, class_id: &str, level: &str) -> Self {
        TestActor {
            name: name.to_string(),
            class_id: class_id.to_string(),
            level: level.to_string(),
            transform: Transform::default(),
            marker: Some(AutoSaveMarker::new()),
            components: Vec::new(),
            fields: ActorFields { health: 100.0 },
        }
    }

    pub fn unmarked(name: &str, class_id: &str, level: &str) -> Self {
        let mut actor = TestActor::new(name, class_id, level);
        actor.marker = None;
        actor
    }
}

impl SaveFields for TestActor {
    fn capture_fields(&self) -> Result<Vec<u8>, SaveError> {
        encode_fields(&self.fields)
    }

    fn apply_fields(&mut self, bytes: &[u8]) -> Result<(), SaveError> {
        self.fields = decode_fields(bytes)?;
        Ok(())
    }
}

impl Actor for TestActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_id(&self) -> &str {
        &self.class_id
    }

    fn level_name(&self) -> &str {
        &self.level
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn marker(&self) -> Option<&AutoSaveMarker> {
        self.marker.as_ref()
    }

    fn marker_mut(&mut self) -> Option<&mut AutoSaveMarker> {
        self.marker.as_mut()
    }

    fn components_mut(&mut self) -> Vec<&mut dyn Component> {
        self.components
            .iter_mut()
            .map(|component| component as &mut dyn Component)
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentFields {
    pub ammo: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialState {
    pub location: Vec3,
    pub rotation: Rotator,
    pub scale: Vec3,
}

impl Default for SpatialState {
    fn default() -> Self {
        SpatialState {
            location: Vec3::ZERO,
            rotation: Rotator::default(),
            scale: Vec3::ONE,
        }
    }
}

impl Spatial for SpatialState {
    fn local_location(&self) -> Vec3 {
        self.location
    }

    fn set_local_location(&mut self, location: Vec3) {
        self.location = location;
    }

    fn local_rotation(&self) -> Rotator {
        self.rotation
    }

    fn set_local_rotation(&mut self, rotation: Rotator) {
        self.rotation = rotation;
    }

    fn local_scale(&self) -> Vec3 {
        self.scale
    }

    fn set_local_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhysicsState {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Physical for PhysicsState {
    fn linear_velocity(&self) -> Vec3 {
        self.linear
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.linear = velocity;
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.angular = velocity;
    }
}

pub struct TestComponent {
    pub name: String,
    pub spatial: Option<SpatialState>,
    pub physics: Option<PhysicsState>,
    pub storer: bool,
    pub fields: ComponentFields,
}

impl TestComponent {
    pub fn new(name: &str) -> Self {
        TestComponent {
            name: name.to_string(),
            spatial: None,
            physics: None,
            storer: false,
            fields: ComponentFields::default(),
        }
    }

    pub fn spatial(name: &str) -> Self {
        let mut component = TestComponent::new(name);
        component.spatial = Some(SpatialState::default());
        component
    }

    pub fn physics(name: &str) -> Self {
        let mut component = TestComponent::new(name);
        component.physics = Some(PhysicsState::default());
        component
    }

    pub fn storer(name: &str) -> Self {
        let mut component = TestComponent::new(name);
        component.storer = true;
        component
    }
}

impl SaveFields for TestComponent {
    fn capture_fields(&self) -> Result<Vec<u8>, SaveError> {
        encode_fields(&self.fields)
    }

    fn apply_fields(&mut self, bytes: &[u8]) -> Result<(), SaveError> {
        self.fields = decode_fields(bytes)?;
        Ok(())
    }
}

impl Component for TestComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_spatial(&mut self) -> Option<&mut dyn Spatial> {
        self.spatial.as_mut().map(|state| state as &mut dyn Spatial)
    }

    fn as_physical(&mut self) -> Option<&mut dyn Physical> {
        self.physics.as_mut().map(|state| state as &mut dyn Physical)
    }

    fn is_storer(&self) -> bool {
        self.storer
    }
}

/// In-memory world: actors in insertion order, spawnable classes as a
/// registry, destroys and sweeps recorded for assertions.
pub struct TestWorld {
    actors: Vec<(ActorHandle, TestActor)>,
    marked_classes: Vec<String>,
    unmarked_classes: Vec<String>,
    next_id: u64,
    pub destroyed: Vec<String>,
    pub sweep_count: usize,
}

impl TestWorld {
    pub fn new() -> Self {
        TestWorld {
            actors: Vec::new(),
            marked_classes: Vec::new(),
            unmarked_classes: Vec::new(),
            next_id: 0,
            destroyed: Vec::new(),
            sweep_count: 0,
        }
    }

    pub fn insert(&mut self, actor: TestActor) -> ActorHandle {
        let handle = ActorHandle(self.next_id);
        self.next_id += 1;
        self.actors.push((handle, actor));
        handle
    }

    /// Make `class_id` spawnable; spawned instances come up with a marker.
    pub fn register_class(&mut self, class_id: &str) {
        self.marked_classes.push(class_id.to_string());
    }

    /// Make `class_id` spawnable without a marker.
    pub fn register_unmarked_class(&mut self, class_id: &str) {
        self.unmarked_classes.push(class_id.to_string());
    }

    pub fn actor_by_name(&self, name: &str) -> Option<&TestActor> {
        self.actors
            .iter()
            .find(|(_, actor)| actor.name == name)
            .map(|(_, actor)| actor)
    }

    pub fn actor_by_name_mut(&mut self, name: &str) -> Option<&mut TestActor> {
        self.actors
            .iter_mut()
            .find(|(_, actor)| actor.name == name)
            .map(|(_, actor)| actor)
    }
}

impl World for TestWorld {
    fn handles(&self) -> Vec<ActorHandle> {
        self.actors.iter().map(|(handle, _)| *handle).collect()
    }

    fn actor(&self, handle: ActorHandle) -> Option<&dyn Actor> {
        self.actors
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, actor)| actor as &dyn Actor)
    }

    fn actor_mut(&mut self, handle: ActorHandle) -> Option<&mut dyn Actor> {
        self.actors
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .map(|(_, actor)| actor as &mut dyn Actor)
    }

    fn spawn(
        &mut self,
        class_id: &str,
        transform: Transform,
        id: SpawnId,
        level_name: &str,
    ) -> Option<ActorHandle> {
        let marked = self.marked_classes.iter().any(|c| c == class_id);
        let unmarked = self.unmarked_classes.iter().any(|c| c == class_id);
        if !marked && !unmarked {
            return None;
        }
        let name = match id {
            SpawnId::Keep(name) => name,
            SpawnId::Random => format!("{}_{:04}", class_id, self.next_id),
        };
        let mut actor = TestActor::new(&name, class_id, level_name);
        actor.transform = transform;
        if unmarked {
            actor.marker = None;
        }
        Some(self.insert(actor))
    }

    fn destroy(&mut self, handle: ActorHandle) {
        if let Some(index) = self.actors.iter().position(|(h, _)| *h == handle) {
            let (_, actor) = self.actors.remove(index);
            self.destroyed.push(actor.name);
        }
    }

    fn sweep(&mut self) {
        self.sweep_count += 1;
    }
}

/// Records every event with the name of the actor it fired for.
#[derive(Default)]
pub struct CollectingSink {
    pub events: Vec<(SaveEvent, String)>,
}

impl EventSink for CollectingSink {
    fn handle(&mut self, event: SaveEvent, actor: &mut dyn Actor) {
        self.events.push((event, actor.name().to_string()));
    }
}

/// Vetoes destruction of unsaved orphans by clearing the marker flag from
/// inside the hook.
pub struct VetoSink;

impl EventSink for VetoSink {
    fn handle(&mut self, event: SaveEvent, actor: &mut dyn Actor) {
        if event == SaveEvent::DestroyUnsaved {
            if let Some(marker) = actor.marker_mut() {
                marker.destroy_on_load_if_unsaved = false;
            }
        }
    }
}
