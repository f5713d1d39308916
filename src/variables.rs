//! Display variables projected from the room registry
//!
//! Values are recomputed on every notification cycle; only the ones that
//! changed since the previous cycle are published to subscribers.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::notifier::StateObserver;
use crate::state::{Registry, RoomRecord};

/// Number of paired rooms exposed as per-room variables
pub const MAX_ROOM_VARIABLES: usize = 10;

/// Rendered in place of an unknown value
pub const UNKNOWN: &str = "—";

/// Variable id and display label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDefinition {
    pub id: String,
    pub name: String,
}

impl VariableDefinition {
    fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Variable values by id
pub type VariableValues = BTreeMap<String, Value>;

/// Callback receiving `(variable id, new value)`
pub type VariableCallback = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// Every variable this bridge publishes
pub fn variable_definitions() -> Vec<VariableDefinition> {
    let mut defs = vec![
        VariableDefinition::new("added_rooms_count", "Added rooms count"),
        VariableDefinition::new("paired_rooms_count", "Paired rooms count"),
        VariableDefinition::new("added_rooms_list", "Added rooms list (names)"),
        VariableDefinition::new("paired_rooms_list", "Paired rooms list (names)"),
    ];
    for n in 1..=MAX_ROOM_VARIABLES {
        defs.push(VariableDefinition::new(format!("room_{n}_id"), format!("Room {n} ID")));
        defs.push(VariableDefinition::new(format!("room_{n}_name"), format!("Room {n} name")));
        defs.push(VariableDefinition::new(
            format!("room_{n}_meeting_status"),
            format!("Room {n} meeting status"),
        ));
        defs.push(VariableDefinition::new(
            format!("room_{n}_participant_count"),
            format!("Room {n} participant count"),
        ));
        defs.push(VariableDefinition::new(format!("room_{n}_mute"), format!("Room {n} mute status")));
        defs.push(VariableDefinition::new(format!("room_{n}_camera"), format!("Room {n} camera status")));
    }
    defs
}

fn joined_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let joined = names
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        UNKNOWN.to_string()
    } else {
        joined
    }
}

fn on_off(value: Option<bool>, on: &str, off: &str) -> Value {
    match value {
        Some(true) => json!(on),
        Some(false) => json!(off),
        None => json!(UNKNOWN),
    }
}

/// Compute every variable from the current registry
pub fn compute(registry: &Registry) -> VariableValues {
    let mut values = VariableValues::new();
    values.insert("added_rooms_count".into(), json!(registry.added_rooms_count()));
    values.insert("paired_rooms_count".into(), json!(registry.paired_rooms_count()));

    let added = registry.added_rooms();
    let paired = registry.paired_rooms();
    values.insert(
        "added_rooms_list".into(),
        json!(joined_names(added.iter().map(|r| r.name.as_str()))),
    );
    values.insert(
        "paired_rooms_list".into(),
        json!(joined_names(paired.iter().map(|r| r.name.as_str()))),
    );

    for n in 1..=MAX_ROOM_VARIABLES {
        let summary = paired.get(n - 1);
        let record: Option<&RoomRecord> = summary.and_then(|r| registry.room(&r.id));

        let id = summary.map(|r| r.id.clone()).unwrap_or_default();
        let name = summary
            .map(|r| r.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN);

        values.insert(format!("room_{n}_id"), json!(id));
        values.insert(format!("room_{n}_name"), json!(name));
        values.insert(
            format!("room_{n}_meeting_status"),
            json!(record
                .and_then(|r| r.meeting_status.as_deref())
                .unwrap_or(UNKNOWN)),
        );
        values.insert(
            format!("room_{n}_participant_count"),
            record
                .and_then(|r| r.participant_count)
                .map(|c| json!(c))
                .unwrap_or_else(|| json!(UNKNOWN)),
        );
        // muteStatus true means the mic is live
        values.insert(
            format!("room_{n}_mute"),
            on_off(record.and_then(|r| r.mute_status), "Unmuted", "Muted"),
        );
        values.insert(
            format!("room_{n}_camera"),
            on_off(record.and_then(|r| r.camera_status), "On", "Off"),
        );
    }

    values
}

/// Keeps the last published values and reports changes
#[derive(Default)]
pub struct VariableStore {
    values: VariableValues,
    callbacks: Vec<VariableCallback>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: VariableCallback) {
        self.callbacks.push(callback);
    }

    pub fn values(&self) -> &VariableValues {
        &self.values
    }

    /// Recompute and return the ids whose value changed
    pub fn refresh(&mut self, registry: &Registry) -> Vec<String> {
        let next = compute(registry);
        let changed: Vec<String> = next
            .iter()
            .filter(|(id, value)| self.values.get(*id) != Some(*value))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &changed {
            let value = &next[id];
            debug!(variable = %id, %value, "Variable changed");
            for callback in &self.callbacks {
                callback(id, value);
            }
        }

        self.values = next;
        changed
    }
}

impl StateObserver for VariableStore {
    fn name(&self) -> &str {
        "variables"
    }

    fn on_state_changed(&mut self, registry: &Registry) {
        self.refresh(registry);
    }
}
