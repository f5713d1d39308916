//! State management module - room registry assembled from OSC telemetry
//!
//! The registry tracks the added/paired room lists streamed by the device and
//! a record per room with its live attributes (meeting, mute, camera, ...).

mod registry;
mod room_list;
mod types;

pub use registry::Registry;
pub use room_list::{ListUpdate, RoomList, MAX_LIST_LEN};
pub use types::{ListKind, RoomAttribute, RoomRecord, RoomSummary};
