//! Boolean feedback predicates over the room registry

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::notifier::StateObserver;
use crate::state::{ListKind, Registry};

/// Predicate kinds a binding can evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    /// Room appears in the paired list
    RoomPaired,
    /// Meeting status known and not idle
    InMeeting,
    /// Mic is unmuted
    MuteStatus,
    /// Camera is on
    CameraStatus,
}

impl FeedbackKind {
    pub const ALL: [FeedbackKind; 4] = [
        FeedbackKind::RoomPaired,
        FeedbackKind::InMeeting,
        FeedbackKind::MuteStatus,
        FeedbackKind::CameraStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::RoomPaired => "room_paired",
            FeedbackKind::InMeeting => "in_meeting",
            FeedbackKind::MuteStatus => "mute_status",
            FeedbackKind::CameraStatus => "camera_status",
        }
    }

    /// Evaluate this predicate for one room; an empty id is always false
    pub fn evaluate(&self, registry: &Registry, room_id: &str) -> bool {
        if room_id.is_empty() {
            return false;
        }
        match self {
            FeedbackKind::RoomPaired => registry.list(ListKind::Paired).contains(room_id),
            FeedbackKind::InMeeting => registry
                .room(room_id)
                .and_then(|room| room.meeting_status.as_deref())
                .map(|status| {
                    let status = status.to_lowercase();
                    !status.is_empty() && status != "not in meeting" && status != "idle"
                })
                .unwrap_or(false),
            FeedbackKind::MuteStatus => registry
                .room(room_id)
                .and_then(|room| room.mute_status)
                == Some(true),
            FeedbackKind::CameraStatus => registry
                .room(room_id)
                .and_then(|room| room.camera_status)
                == Some(true),
        }
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured feedback: one predicate bound to one room
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedbackBinding {
    pub id: String,
    pub kind: FeedbackKind,
    #[serde(default)]
    pub room_id: String,
}

impl FeedbackBinding {
    pub fn new(id: impl Into<String>, kind: FeedbackKind, room_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            room_id: room_id.into(),
        }
    }

    pub fn evaluate(&self, registry: &Registry) -> bool {
        self.kind.evaluate(registry, &self.room_id)
    }
}

/// Callback receiving `(binding id, new state)`
pub type FeedbackCallback = Arc<dyn Fn(&str, bool) + Send + Sync>;

/// Evaluates bindings on every cycle and reports transitions
#[derive(Default)]
pub struct FeedbackEvaluator {
    bindings: Vec<FeedbackBinding>,
    last: HashMap<String, bool>,
    callbacks: Vec<FeedbackCallback>,
}

impl FeedbackEvaluator {
    pub fn new(bindings: Vec<FeedbackBinding>) -> Self {
        Self {
            bindings,
            ..Default::default()
        }
    }

    pub fn subscribe(&mut self, callback: FeedbackCallback) {
        self.callbacks.push(callback);
    }

    /// Last evaluated state of every binding, in binding order
    pub fn states(&self) -> Vec<(String, bool)> {
        self.bindings
            .iter()
            .map(|b| (b.id.clone(), self.last.get(&b.id).copied().unwrap_or(false)))
            .collect()
    }

    /// Re-evaluate and emit bindings whose state changed
    pub fn refresh(&mut self, registry: &Registry) -> Vec<(String, bool)> {
        let mut changed = Vec::new();

        for binding in &self.bindings {
            let state = binding.evaluate(registry);
            let previous = self.last.insert(binding.id.clone(), state);
            if previous == Some(state) {
                continue;
            }

            debug!(feedback = %binding.id, kind = %binding.kind, room = %binding.room_id, state, "Feedback changed");
            for callback in &self.callbacks {
                callback(&binding.id, state);
            }
            changed.push((binding.id.clone(), state));
        }

        changed
    }
}

impl StateObserver for FeedbackEvaluator {
    fn name(&self) -> &str {
        "feedbacks"
    }

    fn on_state_changed(&mut self, registry: &Registry) {
        self.refresh(registry);
    }
}
