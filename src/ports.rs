//! Collaborator contracts (§6): the traits an embedder implements to supply
//! time, scheduling, outgoing text, content resolution, and object
//! construction. `mudcore` calls these but never implements them itself —
//! it has no clock, no socket, no content loader of its own.

use crate::effects::EffectTemplate;
use crate::ids::Oid;
use crate::model::archetype::{Ability, Job, Race};
use crate::model::object::Entity;

pub use crate::logging::Logger;

/// Wall-clock time as milliseconds since an arbitrary fixed epoch. The core
/// never reads system time directly so tests can drive it deterministically.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Recurring timer registration, used for threat decay and effect ticks.
/// The core never polls a timestamp in a loop; it asks the scheduler to
/// call it back.
pub trait Scheduler {
    fn set_interval(&mut self, period_ms: u64) -> TimerHandle;
    fn clear_interval(&mut self, handle: TimerHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageGroup {
    Info,
    System,
    Combat,
}

/// Outgoing text to a single mob's player/AI, tagged by category so the
/// driver can route combat spam separately from system notices.
pub trait Sink {
    fn send(&mut self, target: Oid, text: &str, group: MessageGroup);
}

/// A fully-described, type-erased template record as produced by
/// `crate::serialize`'s template diffing. `mudcore` treats the payload as
/// opaque; only the embedder's `ObjectFactory` interprets it.
#[derive(Debug, Clone)]
pub struct Template {
    pub template_id: String,
    pub type_tag: String,
    pub payload: serde_json::Value,
}

/// Constructs a live entity from a template, optionally with a caller-chosen
/// oid (used during reset/respawn so the embedder controls id allocation).
pub trait ObjectFactory {
    fn create_from_template(&mut self, template: &Template, oid: Option<Oid>) -> Entity;
}

/// A room-presence event as seen by an observing mob's AI (§5: "per-mob AI
/// event sink is a pub/sub channel owned by the mob; subscribers live
/// outside the core"). `mudcore` only publishes; it never interprets these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomEvent {
    /// Another mob just arrived in the observer's room.
    Entrance,
    /// The observer just arrived and can now see the room's occupants.
    Sight,
    /// Another mob just left the observer's room.
    Exit,
}

/// Publishes room-presence events to a mob's AI event sink.
pub trait AiEventSink {
    fn publish(
        &mut self,
        observer_oid: Oid,
        subject_oid: Oid,
        event: RoomEvent,
        dir: Option<crate::direction::Direction>,
    );
}

/// Resolves content ids to their definitions. `mudcore` never embeds a race,
/// job, ability, or effect catalogue — those are data the embedder loads.
pub trait ArchetypeResolver {
    fn resolve_race(&self, id: &str) -> Option<&Race>;
    fn resolve_job(&self, id: &str) -> Option<&Job>;
    fn resolve_ability(&self, id: &str) -> Option<&Ability>;
    fn resolve_effect(&self, id: &str) -> Option<&EffectTemplate>;
}
