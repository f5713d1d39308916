//! Room state type definitions
//!
//! Defines the room summary produced by list rebuilds, the per-room record
//! with its live attributes, and the typed attribute updates applied to it.

use serde::{Deserialize, Serialize};

/// One entry of an added/paired room list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// Room identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// 1-based position in the list
    pub index: u32,
}

impl RoomSummary {
    pub fn new(id: impl Into<String>, name: impl Into<String>, index: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            index,
        }
    }

    /// Stand-in for a slot whose fragment has not arrived yet
    pub fn placeholder(index: u32) -> Self {
        Self::new("", "", index)
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_empty()
    }
}

/// Which of the two streamed room lists a message refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Added,
    Paired,
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListKind::Added => write!(f, "added"),
            ListKind::Paired => write!(f, "paired"),
        }
    }
}

/// Live state of a single room, keyed by its id
///
/// Every optional attribute is `None` until the device first reports it;
/// `None` means "unknown", never false/zero/empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub id: String,
    pub name: String,
    pub index: i64,
    pub meeting_status: Option<String>,
    pub participant_count: Option<i64>,
    pub mute_status: Option<bool>,
    pub camera_status: Option<bool>,
    pub selected_primary_camera: Option<String>,
    pub selected_mic: Option<String>,
    pub selected_speaker: Option<String>,
}

impl RoomRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, index: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            index,
            meeting_status: None,
            participant_count: None,
            mute_status: None,
            camera_status: None,
            selected_primary_camera: None,
            selected_mic: None,
            selected_speaker: None,
        }
    }

    /// Refresh name/index from a message prefix; absent values leave the field as is
    pub fn refresh_identity(&mut self, name: Option<String>, index: Option<i64>) {
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(index) = index {
            self.index = index;
        }
    }

    /// Write one attribute value
    pub fn apply(&mut self, attribute: RoomAttribute) {
        match attribute {
            RoomAttribute::MeetingStatus(v) => self.meeting_status = Some(v),
            RoomAttribute::ParticipantCount(v) => self.participant_count = Some(v),
            RoomAttribute::MuteStatus(v) => self.mute_status = Some(v),
            RoomAttribute::CameraStatus(v) => self.camera_status = Some(v),
            RoomAttribute::SelectedPrimaryCamera(v) => self.selected_primary_camera = Some(v),
            RoomAttribute::SelectedMic(v) => self.selected_mic = Some(v),
            RoomAttribute::SelectedSpeaker(v) => self.selected_speaker = Some(v),
        }
    }
}

/// A decoded per-room attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomAttribute {
    MeetingStatus(String),
    ParticipantCount(i64),
    MuteStatus(bool),
    CameraStatus(bool),
    SelectedPrimaryCamera(String),
    SelectedMic(String),
    SelectedSpeaker(String),
}
