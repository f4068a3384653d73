//! Room bookkeeping shared by every view of a session

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use openapi_client::models::RealtimeFrame;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::models::entity::{id_from_value, EntityKind};
use crate::realtime::room::Room;

const EVENT_CAPACITY: usize = 256;

/// An entity change pushed by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct EntityEvent {
    pub room: Room,

    /// Event name, e.g. `campaign_updated`
    pub name: String,

    /// Id of the changed entity
    pub id: String,

    /// Partial record
    pub payload: Map<String, Value>,
}

struct HubInner {
    rooms: Mutex<HashMap<Room, usize>>,
    outbound: mpsc::UnboundedSender<RealtimeFrame>,
    events: broadcast::Sender<EntityEvent>,
}

impl HubInner {
    fn rooms(&self) -> MutexGuard<'_, HashMap<Room, usize>> {
        self.rooms.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn send(&self, frame: RealtimeFrame) {
        // Nobody drains the queue when real-time is disabled
        if self.outbound.send(frame).is_err() {
            debug!("Realtime connection closed, frame dropped");
        }
    }

    fn release(&self, room: &Room) {
        let mut rooms = self.rooms();
        let Some(count) = rooms.get_mut(room) else {
            return;
        };
        *count -= 1;
        if *count == 0 {
            rooms.remove(room);
            debug!("Leaving room {}", room);
            self.send(RealtimeFrame::Leave {
                room: room.to_string(),
            });
        }
    }
}

/// Reference-counted room registry and event fan-out
#[derive(Clone)]
pub struct RealtimeHub {
    inner: Arc<HubInner>,
}

impl RealtimeHub {
    /// Create a hub and the queue of frames the connection worker must send
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RealtimeFrame>) {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let hub = Self {
            inner: Arc::new(HubInner {
                rooms: Mutex::new(HashMap::new()),
                outbound,
                events,
            }),
        };
        (hub, outbound_rx)
    }

    /// Join a room for as long as the returned guard lives
    pub fn join(&self, room: Room) -> RoomSubscription {
        let mut rooms = self.inner.rooms();
        let count = rooms.entry(room.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            debug!("Joining room {}", room);
            self.inner.send(RealtimeFrame::Join {
                room: room.to_string(),
            });
        }
        drop(rooms);

        RoomSubscription {
            inner: self.inner.clone(),
            room,
        }
    }

    /// Rooms with at least one live guard
    pub fn live_rooms(&self) -> Vec<Room> {
        self.inner.rooms().keys().cloned().collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.inner.events.subscribe()
    }

    /// Handle one inbound text frame
    pub fn handle_text(&self, text: &str) {
        let frame: RealtimeFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Ignoring unrecognized realtime frame ({}): {}", e, text);
                return;
            }
        };

        match frame {
            RealtimeFrame::Event { room, event, data } => self.dispatch(&room, event, data),
            RealtimeFrame::Pong => debug!("Realtime pong received"),
            other => warn!("Unexpected realtime frame: {:?}", other),
        }
    }

    fn dispatch(&self, room: &str, name: String, data: Value) {
        let room: Room = match room.parse() {
            Ok(room) => room,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };
        let Value::Object(payload) = data else {
            warn!("Ignoring {} event on {} without an object payload", name, room);
            return;
        };

        let id = payload
            .get("id")
            .and_then(id_from_value)
            .unwrap_or_else(|| room.id.clone());

        debug!("Event {} for {}", name, room);
        let _ = self.inner.events.send(EntityEvent {
            room,
            name,
            id,
            payload,
        });
    }
}

/// Membership of one room. Dropping the guard releases it exactly once.
pub struct RoomSubscription {
    inner: Arc<HubInner>,
    room: Room,
}

impl RoomSubscription {
    pub fn room(&self) -> &Room {
        &self.room
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        self.inner.release(&self.room);
    }
}

/// The set of rooms one list view holds, following its displayed ids
pub struct RoomSet {
    hub: RealtimeHub,
    kind: EntityKind,
    held: HashMap<String, RoomSubscription>,
}

impl RoomSet {
    pub fn new(hub: RealtimeHub, kind: EntityKind) -> Self {
        Self {
            hub,
            kind,
            held: HashMap::new(),
        }
    }

    /// Hold exactly the rooms for `ids`, leaving the others
    pub fn retain_only<S: AsRef<str>>(&mut self, ids: &[S]) {
        let wanted: HashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
        self.held.retain(|id, _| wanted.contains(id.as_str()));

        for id in wanted {
            if !self.held.contains_key(id) {
                let guard = self.hub.join(Room::new(self.kind, id));
                self.held.insert(id.to_string(), guard);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}
