//! Capture engine and save orchestrator.
//!
//! Capture walks a live actor, resolves the per-component overrides
//! against the marker's defaults, and converts the result into an
//! [`ActorRecord`]. The orchestrator runs capture over every candidate
//! actor of every requested level and merges the records into the
//! caller's [`SaveObject`], replacing any stale record for the same level.

use log::{debug, warn};

use crate::marker::{AutoSaveMarker, EventSink, SaveEvent};
use crate::scene::{Actor, Component, LevelWithActors, SaveFields, World};
use crate::types::{ActorRecord, ComponentRecord, MapRecord, SaveError, SaveObject};

/// The effective spatial/physics flags for one component after the
/// override/default merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ResolvedPolicy {
    pub save_location: bool,
    pub save_rotation: bool,
    pub save_scale: bool,
    pub save_linear_velocity: bool,
    pub save_angular_velocity: bool,
}

/// Merge the marker defaults with the override option for one component.
///
/// Returns `None` when the component is excluded from capture: either the
/// defaults say "no components" and no override names it, or an override
/// names it with `save == false`. The same resolution runs on load, so a
/// component is only ever touched under the policy it was captured with.
pub(crate) fn resolve_policy(
    marker: &AutoSaveMarker,
    component_name: &str,
) -> Option<ResolvedPolicy> {
    match marker.find_override(component_name) {
        Some(option) => option.save.then_some(ResolvedPolicy {
            save_location: option.save_location,
            save_rotation: option.save_rotation,
            save_scale: option.save_scale,
            save_linear_velocity: option.save_linear_velocity,
            save_angular_velocity: option.save_angular_velocity,
        }),
        None => marker.save_components.then_some(ResolvedPolicy {
            save_location: marker.save_locations,
            save_rotation: marker.save_rotations,
            save_scale: marker.save_scales,
            save_linear_velocity: marker.save_linear_velocities,
            save_angular_velocity: marker.save_angular_velocities,
        }),
    }
}

fn capture_component(
    component: &mut dyn Component,
    policy: ResolvedPolicy,
) -> Result<ComponentRecord, SaveError> {
    let mut record = ComponentRecord {
        name: component.name().to_string(),
        ..ComponentRecord::default()
    };

    // Storer components serialize themselves wholesale; selective
    // spatial/physics capture does not apply to them.
    if component.is_storer() {
        record.data = component.capture_fields()?;
        return Ok(record);
    }

    if let Some(spatial) = component.as_spatial() {
        if policy.save_location {
            record.location = Some(spatial.local_location());
        }
        if policy.save_rotation {
            record.rotation = Some(spatial.local_rotation());
        }
        if policy.save_scale {
            record.scale = Some(spatial.local_scale());
        }
    }
    if let Some(physical) = component.as_physical() {
        if policy.save_linear_velocity {
            record.linear_velocity = Some(physical.linear_velocity());
        }
        if policy.save_angular_velocity {
            record.angular_velocity = Some(physical.angular_velocity());
        }
    }
    record.data = component.capture_fields()?;
    Ok(record)
}

/// Capture one actor into a record: name, class, world transform, its own
/// field data, and a component record per eligible component.
///
/// The marker's own state is captured as an ordinary component record
/// (first, matched later by the marker's name) so that load-time policy
/// matches the policy in effect when the file was written. Returns `None`
/// when the actor carries no marker or the marker is disabled.
pub fn capture_actor(actor: &mut dyn Actor) -> Result<Option<ActorRecord>, SaveError> {
    let Some(marker) = actor.marker().cloned() else {
        return Ok(None);
    };
    if !marker.enabled {
        return Ok(None);
    }

    let mut record = ActorRecord {
        name: actor.name().to_string(),
        class_id: actor.class_id().to_string(),
        transform: actor.transform(),
        load_random_id: marker.load_with_random_id,
        data: actor.capture_fields()?,
        components: Vec::new(),
    };

    // No component is eligible when components are off by default and no
    // override exists; skip the walk entirely.
    if !marker.save_components && marker.overrides.is_empty() {
        return Ok(Some(record));
    }

    if resolve_policy(&marker, &marker.name).is_some() {
        record.components.push(ComponentRecord {
            name: marker.name.clone(),
            data: marker.capture_fields()?,
            ..ComponentRecord::default()
        });
    }

    for component in actor.components_mut() {
        if let Some(policy) = resolve_policy(&marker, component.name()) {
            record.components.push(capture_component(component, policy)?);
        }
    }
    Ok(Some(record))
}

/// Capture every candidate actor of every requested level into the save
/// object.
///
/// Any existing map record for a requested level is removed first and
/// replaced with a fresh one, so capturing the same level twice replaces
/// rather than appends. Actors whose marker is absent or disabled are
/// silently excluded and fire no hooks. Within a level, record order
/// follows the caller's candidate order.
///
/// Returns false, with no side effects, when `levels` is empty.
pub fn capture_levels(
    save: &mut SaveObject,
    world: &mut dyn World,
    levels: &[LevelWithActors],
    sink: &mut dyn EventSink,
) -> bool {
    if levels.is_empty() {
        return false;
    }

    for level in levels {
        save.remove_map(&level.name);
        save.maps.push(MapRecord { name: level.name.clone(), actors: Vec::new() });
    }

    for level in levels {
        if level.actors.is_empty() {
            continue;
        }
        let Some(map_index) = save.find_map(&level.name) else { continue };

        for candidate in &level.actors {
            let Some(actor) = world.actor_mut(candidate.handle) else { continue };
            let enabled = actor.marker().is_some_and(|marker| marker.enabled);
            if !enabled {
                continue;
            }

            if let Some(marker) = actor.marker_mut() {
                marker.was_saved = true;
            }
            sink.handle(SaveEvent::SaveBegin, actor);

            match capture_actor(actor) {
                Ok(Some(record)) => {
                    save.maps[map_index].actors.push(record);
                    sink.handle(SaveEvent::SaveEnd, actor);
                }
                // The SaveBegin hook may have disabled the marker; the
                // actor simply drops out of this capture.
                Ok(None) => {}
                Err(err) => {
                    warn!("skipping actor '{}' during capture: {}", actor.name(), err);
                }
            }
        }
        debug!(
            "captured {} actor(s) into level '{}'",
            save.maps[map_index].actors.len(),
            level.name
        );
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{CollectingSink, TestActor, TestComponent, TestWorld};
    use crate::marker::NullSink;
    use crate::scene::collect_levels;
    use crate::types::{ComponentOverrideOption, Transform, Vec3};

    fn marked_world() -> (TestWorld, TestActor) {
        (TestWorld::new(), TestActor::new("P1", "Pawn", "/game/level1"))
    }

    #[test]
    fn test_capture_actor_records_identity_and_transform() {
        let (mut world, mut actor) = marked_world();
        actor.transform = Transform::from_location(Vec3::new(3.0, 4.0, 5.0));
        let handle = world.insert(actor);

        let actor = world.actor_mut(handle).unwrap();
        let record = capture_actor(actor).unwrap().unwrap();

        assert_eq!(record.name, "P1");
        assert_eq!(record.class_id, "Pawn");
        assert_eq!(record.transform.location, Vec3::new(3.0, 4.0, 5.0));
        assert!(!record.load_random_id);
        // Components are off by default, so only the actor data is there.
        assert!(record.components.is_empty());
    }

    #[test]
    fn test_capture_actor_skips_disabled_marker() {
        let (mut world, mut actor) = marked_world();
        actor.marker.as_mut().unwrap().enabled = false;
        let handle = world.insert(actor);

        let actor = world.actor_mut(handle).unwrap();
        assert!(capture_actor(actor).unwrap().is_none());
    }

    #[test]
    fn test_component_capture_follows_defaults() {
        let (mut world, mut actor) = marked_world();
        actor.marker = Some(crate::marker::AutoSaveMarker::saving_components());
        actor.components.push(TestComponent::spatial("mesh"));
        actor.components.push(TestComponent::physics("body"));
        let handle = world.insert(actor);

        let record = capture_actor(world.actor_mut(handle).unwrap()).unwrap().unwrap();

        // marker record first, then components in discovery order
        assert_eq!(record.components.len(), 3);
        assert_eq!(record.components[0].name, "autosave");
        let mesh = &record.components[1];
        assert_eq!(mesh.name, "mesh");
        assert!(mesh.location.is_some());
        assert!(mesh.rotation.is_some());
        assert!(mesh.scale.is_some());
        assert!(mesh.linear_velocity.is_none());
        let body = &record.components[2];
        assert!(body.linear_velocity.is_some());
        assert!(body.angular_velocity.is_some());
    }

    #[test]
    fn test_override_excludes_named_component() {
        let (mut world, mut actor) = marked_world();
        let mut marker = crate::marker::AutoSaveMarker::saving_components();
        marker.overrides.push(ComponentOverrideOption::skip("mesh"));
        actor.marker = Some(marker);
        actor.components.push(TestComponent::spatial("mesh"));
        actor.components.push(TestComponent::new("inventory"));
        let handle = world.insert(actor);

        let record = capture_actor(world.actor_mut(handle).unwrap()).unwrap().unwrap();

        let names: Vec<&str> =
            record.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["autosave", "inventory"]);
    }

    #[test]
    fn test_override_includes_component_when_defaults_off() {
        let (mut world, mut actor) = marked_world();
        let mut marker = crate::marker::AutoSaveMarker::new();
        assert!(!marker.save_components);
        marker.overrides.push(ComponentOverrideOption {
            name: "mesh".to_string(),
            save_rotation: false,
            ..ComponentOverrideOption::default()
        });
        actor.marker = Some(marker);
        actor.components.push(TestComponent::spatial("mesh"));
        actor.components.push(TestComponent::new("ignored"));
        let handle = world.insert(actor);

        let record = capture_actor(world.actor_mut(handle).unwrap()).unwrap().unwrap();

        // Defaults are off, so only the overridden component appears; the
        // marker has no override either and is skipped with the rest.
        assert_eq!(record.components.len(), 1);
        let mesh = &record.components[0];
        assert_eq!(mesh.name, "mesh");
        assert!(mesh.location.is_some());
        assert!(mesh.rotation.is_none());
    }

    #[test]
    fn test_storer_component_captures_fields_only() {
        let (mut world, mut actor) = marked_world();
        actor.marker = Some(crate::marker::AutoSaveMarker::saving_components());
        actor.components.push(TestComponent::storer("stash"));
        let handle = world.insert(actor);

        let record = capture_actor(world.actor_mut(handle).unwrap()).unwrap().unwrap();
        let stash = record.components.iter().find(|c| c.name == "stash").unwrap();

        assert!(!stash.data.is_empty());
        assert!(stash.location.is_none());
        assert!(stash.linear_velocity.is_none());
    }

    #[test]
    fn test_capture_levels_is_idempotent_per_level() {
        let mut world = TestWorld::new();
        world.insert(TestActor::new("P1", "Pawn", "/game/level1"));

        let levels = collect_levels(&world, &["/game/level1"]);
        let mut save = SaveObject::new();

        assert!(capture_levels(&mut save, &mut world, &levels, &mut NullSink));
        assert!(capture_levels(&mut save, &mut world, &levels, &mut NullSink));

        assert_eq!(save.level_count(), 1);
        assert_eq!(save.actor_count_in_level(0), 1);
        assert_eq!(save.maps[0].actors[0].name, "P1");
    }

    #[test]
    fn test_capture_levels_empty_input_is_a_no_op() {
        let mut world = TestWorld::new();
        let mut save = SaveObject::new();
        assert!(!capture_levels(&mut save, &mut world, &[], &mut NullSink));
        assert!(!save.contains_save_data());
    }

    #[test]
    fn test_capture_levels_fires_hooks_and_marks_saved() {
        let mut world = TestWorld::new();
        let mut disabled = TestActor::new("ghost", "Pawn", "/game/level1");
        disabled.marker.as_mut().unwrap().enabled = false;
        world.insert(TestActor::new("P1", "Pawn", "/game/level1"));
        world.insert(disabled);

        let levels = collect_levels(&world, &["/game/level1"]);
        let mut save = SaveObject::new();
        let mut sink = CollectingSink::default();
        capture_levels(&mut save, &mut world, &levels, &mut sink);

        assert_eq!(
            sink.events,
            vec![
                (SaveEvent::SaveBegin, "P1".to_string()),
                (SaveEvent::SaveEnd, "P1".to_string()),
            ]
        );
        assert!(world.actor_by_name("P1").unwrap().marker.as_ref().unwrap().was_saved);
        assert!(!world.actor_by_name("ghost").unwrap().marker.as_ref().unwrap().was_saved);
    }

    #[test]
    fn test_capture_preserves_candidate_order() {
        let mut world = TestWorld::new();
        world.insert(TestActor::new("b", "Pawn", "/game/level1"));
        world.insert(TestActor::new("a", "Pawn", "/game/level1"));

        let levels = collect_levels(&world, &["/game/level1"]);
        let mut save = SaveObject::new();
        capture_levels(&mut save, &mut world, &levels, &mut NullSink);

        let names: Vec<&str> =
            save.maps[0].actors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
