//! Registry - per-session room state assembled from device telemetry
//!
//! Owned by exactly one session. The session hands out `&mut Registry` to the
//! router for each inbound message and `&Registry` to observers afterwards, so
//! no locking is involved.

use serde::Serialize;
use std::collections::HashMap;

use super::room_list::{ListUpdate, RoomList};
use super::types::{ListKind, RoomRecord, RoomSummary};

/// Room registry for one connection
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    added_rooms: RoomList,
    paired_rooms: RoomList,
    added_rooms_count: u32,
    paired_rooms_count: u32,
    rooms: HashMap<String, RoomRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, kind: ListKind) -> &RoomList {
        match kind {
            ListKind::Added => &self.added_rooms,
            ListKind::Paired => &self.paired_rooms,
        }
    }

    pub fn added_rooms(&self) -> Vec<RoomSummary> {
        self.added_rooms.rooms()
    }

    pub fn paired_rooms(&self) -> Vec<RoomSummary> {
        self.paired_rooms.rooms()
    }

    pub fn count(&self, kind: ListKind) -> u32 {
        match kind {
            ListKind::Added => self.added_rooms_count,
            ListKind::Paired => self.paired_rooms_count,
        }
    }

    pub fn added_rooms_count(&self) -> u32 {
        self.added_rooms_count
    }

    pub fn paired_rooms_count(&self) -> u32 {
        self.paired_rooms_count
    }

    pub fn set_count(&mut self, kind: ListKind, count: u32) {
        match kind {
            ListKind::Added => self.added_rooms_count = count,
            ListKind::Paired => self.paired_rooms_count = count,
        }
    }

    /// Apply a list rebuild fragment to the added or paired list
    pub fn apply_list_fragment(
        &mut self,
        kind: ListKind,
        max_list: Option<i64>,
        index: i64,
        id: String,
        name: String,
    ) -> ListUpdate {
        let list = match kind {
            ListKind::Added => &mut self.added_rooms,
            ListKind::Paired => &mut self.paired_rooms,
        };
        list.apply_fragment(max_list, index, id, name)
    }

    pub fn room(&self, id: &str) -> Option<&RoomRecord> {
        self.rooms.get(id)
    }

    pub fn rooms(&self) -> &HashMap<String, RoomRecord> {
        &self.rooms
    }

    /// Fetch the record for `id`, creating it on first sight
    ///
    /// A new record takes `name`/`index` from the prefix (empty/0 when absent);
    /// an existing one has them refreshed when present.
    pub fn upsert_room(
        &mut self,
        id: &str,
        name: Option<String>,
        index: Option<i64>,
    ) -> &mut RoomRecord {
        let room = self
            .rooms
            .entry(id.to_string())
            .or_insert_with(|| RoomRecord::new(id, "", 0));
        room.refresh_identity(name, index);
        room
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_creates_then_refreshes() {
        let mut registry = Registry::new();
        registry.upsert_room("r1", Some("Room One".into()), Some(1));
        assert_eq!(registry.room("r1").unwrap().name, "Room One");

        registry.upsert_room("r1", None, Some(2));
        let room = registry.room("r1").unwrap();
        assert_eq!(room.name, "Room One");
        assert_eq!(room.index, 2);
        assert_eq!(registry.rooms().len(), 1);
    }

    #[test]
    fn test_upsert_defaults_when_prefix_incomplete() {
        let mut registry = Registry::new();
        registry.upsert_room("r9", None, None);
        let room = registry.room("r9").unwrap();
        assert_eq!(room.name, "");
        assert_eq!(room.index, 0);
    }

    #[test]
    fn test_lists_are_independent() {
        let mut registry = Registry::new();
        registry.apply_list_fragment(ListKind::Added, Some(1), 0, "a".into(), "A".into());
        assert_eq!(registry.added_rooms().len(), 1);
        assert!(registry.paired_rooms().is_empty());

        registry.set_count(ListKind::Paired, 3);
        assert_eq!(registry.paired_rooms_count(), 3);
        assert_eq!(registry.added_rooms_count(), 0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut registry = Registry::new();
        registry.apply_list_fragment(ListKind::Paired, Some(1), 0, "r1".into(), "One".into());
        registry.upsert_room("r1", Some("One".into()), Some(1));

        let json = serde_json::to_value(&registry).unwrap();
        assert_eq!(json["pairedRooms"][0]["id"], "r1");
        assert_eq!(json["pairedRoomsCount"], 0);
        assert_eq!(json["rooms"]["r1"]["index"], 1);
    }
}
