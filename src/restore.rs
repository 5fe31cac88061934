//! Load/reconciliation engine.
//!
//! A load pass is driven by the save object: for each recorded level, each
//! actor record is matched against the level's live actors by name and
//! applied in place, or materialized by spawning a fresh instance. Live
//! actors that no record claims are orphans and are destroyed or kept
//! according to their marker's policy.

use log::{debug, warn};

use crate::capture::resolve_policy;
use crate::marker::{EventSink, SaveEvent};
use crate::scene::{Actor, ActorHandle, Component, LevelWithActors, LiveActor, SaveFields, SpawnId, World};
use crate::types::{ActorRecord, ComponentRecord, SaveError, SaveObject};

/// Policy knobs for a reconciliation pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcilePolicy {
    /// Destroy live actors that match a record but whose marker is absent
    /// or disabled. Off by default: such actors are left untouched, which
    /// is the original behavior for pre-existing actors. Freshly spawned
    /// actors without a usable marker are always destroyed regardless.
    pub destroy_uncontrolled: bool,
}

fn apply_component(
    record: &ComponentRecord,
    component: &mut dyn Component,
    policy: crate::capture::ResolvedPolicy,
) -> Result<(), SaveError> {
    // Storer components restore themselves wholesale.
    if component.is_storer() {
        return component.apply_fields(&record.data);
    }

    component.apply_fields(&record.data)?;

    if let Some(spatial) = component.as_spatial() {
        if policy.save_location {
            if let Some(location) = record.location {
                spatial.set_local_location(location);
            }
        }
        if policy.save_rotation {
            if let Some(rotation) = record.rotation {
                spatial.set_local_rotation(rotation);
            }
        }
        if policy.save_scale {
            if let Some(scale) = record.scale {
                spatial.set_local_scale(scale);
            }
        }
    }
    if let Some(physical) = component.as_physical() {
        if policy.save_linear_velocity {
            if let Some(velocity) = record.linear_velocity {
                physical.set_linear_velocity(velocity);
            }
        }
        if policy.save_angular_velocity {
            if let Some(velocity) = record.angular_velocity {
                physical.set_angular_velocity(velocity);
            }
        }
    }
    Ok(())
}

/// Apply one actor record to a live actor: marker state first (so the
/// load runs under the policy the file was saved with), then the actor's
/// own fields, then each eligible component.
///
/// The actor's world transform is not touched here; the recorded
/// transform is only used when spawning a missing actor.
pub fn apply_record(record: &ActorRecord, actor: &mut dyn Actor) -> Result<(), SaveError> {
    if let Some(marker) = actor.marker_mut() {
        let marker_name = marker.name.clone();
        if let Some(marker_record) =
            record.components.iter().find(|c| c.name == marker_name)
        {
            marker.apply_fields(&marker_record.data)?;
        }
    }

    let Some(marker) = actor.marker().cloned() else {
        return Ok(());
    };
    if !marker.enabled {
        return Ok(());
    }

    actor.apply_fields(&record.data)?;

    if !marker.save_components && marker.overrides.is_empty() {
        return Ok(());
    }
    for component in actor.components_mut() {
        let Some(policy) = resolve_policy(&marker, component.name()) else {
            continue;
        };
        let Some(component_record) =
            record.components.iter().find(|c| c.name == component.name())
        else {
            continue;
        };
        apply_component(component_record, component, policy)?;
    }
    Ok(())
}

/// Apply a record to the actor behind `handle`, or dispose of the actor
/// when it is not under the system's control.
fn load_actor(
    record: &ActorRecord,
    world: &mut dyn World,
    handle: ActorHandle,
    destroy_if_uncontrolled: bool,
    sink: &mut dyn EventSink,
) {
    let controlled = match world.actor(handle) {
        Some(actor) => actor.marker().is_some_and(|marker| marker.enabled),
        None => return,
    };
    if controlled {
        if let Some(actor) = world.actor_mut(handle) {
            sink.handle(SaveEvent::LoadBegin, actor);
            if let Err(err) = apply_record(record, actor) {
                warn!("failed to apply record '{}': {}", record.name, err);
            }
            sink.handle(SaveEvent::LoadEnd, actor);
        }
    } else if destroy_if_uncontrolled {
        world.destroy(handle);
    }
}

/// Orphan disposition: a live candidate no record claimed this pass.
fn reconcile_orphan(world: &mut dyn World, handle: ActorHandle, sink: &mut dyn EventSink) {
    let Some(actor) = world.actor_mut(handle) else { return };
    let Some(marker) = actor.marker() else { return };

    if marker.destroy_on_load_if_unsaved && !marker.was_saved {
        sink.handle(SaveEvent::DestroyUnsaved, actor);
        // The hook may veto destruction by clearing the flag.
        let still_requested =
            actor.marker().is_some_and(|m| m.destroy_on_load_if_unsaved);
        if still_requested {
            world.destroy(handle);
        }
    } else {
        sink.handle(SaveEvent::Unchanged, actor);
    }
}

/// Reconcile a save object against the live scene.
///
/// Iteration is driven by the save object's map order; recorded levels
/// with no matching caller-supplied entry are skipped silently. Within a
/// level, records are matched to live actors by name (first match in
/// candidate order wins if names collide), applied in place or spawned,
/// and every unmatched candidate goes through orphan disposition. Ends
/// with a full unreachable-object sweep.
///
/// Returns false, with no side effects, when `levels` is empty.
pub fn apply_levels(
    save: &SaveObject,
    world: &mut dyn World,
    levels: &[LevelWithActors],
    policy: ReconcilePolicy,
    sink: &mut dyn EventSink,
) -> bool {
    if levels.is_empty() {
        return false;
    }

    for map in &save.maps {
        let Some(level) = levels.iter().find(|level| level.name == map.name) else {
            continue;
        };
        let mut remaining: Vec<LiveActor> = level.actors.clone();
        if remaining.is_empty() && map.actors.is_empty() {
            continue;
        }

        for record in &map.actors {
            let found = remaining.iter().position(|candidate| {
                world
                    .actor(candidate.handle)
                    .is_some_and(|actor| actor.name() == record.name)
            });
            match found {
                Some(index) => {
                    let handle = remaining.remove(index).handle;
                    load_actor(record, world, handle, policy.destroy_uncontrolled, sink);
                }
                None => {
                    let id = if record.load_random_id {
                        SpawnId::Random
                    } else {
                        SpawnId::Keep(record.name.clone())
                    };
                    match world.spawn(&record.class_id, record.transform, id, &map.name) {
                        // A spawn that comes up without a usable marker is
                        // destroyed immediately.
                        Some(handle) => load_actor(record, world, handle, true, sink),
                        None => {
                            warn!(
                                "class '{}' not resolved, record '{}' skipped",
                                record.class_id, record.name
                            );
                        }
                    }
                }
            }
        }

        debug!(
            "level '{}': {} record(s) applied, {} orphan candidate(s)",
            map.name,
            map.actors.len(),
            remaining.len()
        );
        for candidate in remaining {
            reconcile_orphan(world, candidate.handle, sink);
        }
    }

    world.sweep();
    true
}
