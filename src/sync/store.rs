use std::collections::HashMap;
use std::sync::Mutex;

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use log::{info, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::game::board::Color;
use crate::sync::room::{new_room_code, RoomDocument, RoomStatus, RoomUpdate};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("room {0} was not found")]
    RoomNotFound(String),
    #[error("room {0} already has two players")]
    RoomFull(String),
    #[error("identity {identity} holds no seat in room {room}")]
    IdentityConflict { room: String, identity: String },
    #[error("connection to the room store was lost")]
    ConnectionLost,
}

/// One push notification delivered to a subscriber. Every document
/// change is delivered as a full snapshot, including changes caused by
/// the subscriber's own writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Snapshot(RoomDocument),
    ConnectionLost(String),
}

pub struct CreatedRoom {
    pub room_id: String,
    pub document: RoomDocument,
}

#[derive(Debug, PartialEq, Eq)]
pub struct JoinedRoom {
    pub color: Color,
    pub document: RoomDocument,
}

/// Names one live subscription so it can be released explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionToken {
    pub room_id: String,
    id: Uuid,
}

/// A live subscription: a stream of `StoreEvent`s plus the token that
/// releases it. Must be unsubscribed when leaving the room to stop
/// further delivery.
pub struct Subscription {
    pub token: SubscriptionToken,
    events: Option<UnboundedReceiver<StoreEvent>>,
}

impl Subscription {
    /// Hands the event stream to whatever task will consume it. Yields
    /// `None` on a second call.
    pub fn take_events(&mut self) -> Option<UnboundedReceiver<StoreEvent>> {
        self.events.take()
    }
}

/// The shared document store contract consumed by `SessionSync`. One
/// document per room; `publish` is a merge write; `subscribe` delivers
/// every change until the token is released.
pub trait RoomStore: Send + Sync {
    fn create_room(&self, identity: &str) -> Result<CreatedRoom, StoreError>;
    fn join_room(&self, room_id: &str, identity: &str) -> Result<JoinedRoom, StoreError>;
    fn publish(&self, room_id: &str, identity: &str, update: RoomUpdate)
        -> Result<(), StoreError>;
    fn subscribe(&self, room_id: &str) -> Result<Subscription, StoreError>;
    fn unsubscribe(&self, token: &SubscriptionToken);
}

struct RoomEntry {
    document: RoomDocument,
    subscribers: Vec<(Uuid, UnboundedSender<StoreEvent>)>,
}

/// In-process store shared between all connections of one server.
/// Last-write-wins: there is no compare-and-swap guard on turn or a
/// version number, so two clients racing on a stale snapshot can
/// overwrite each other's move. Known limitation, kept as designed.
pub struct MemoryStore {
    rooms: Mutex<HashMap<String, RoomEntry>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, RoomEntry>>, StoreError> {
        self.rooms.lock().map_err(|_| StoreError::ConnectionLost)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

/// Sends the current document to every subscriber of the room,
/// dropping senders whose receiving side has gone away.
fn notify(entry: &mut RoomEntry) {
    let document = entry.document.clone();
    entry.subscribers.retain(|(id, sender)| {
        match sender.unbounded_send(StoreEvent::Snapshot(document.clone())) {
            Ok(()) => true,
            Err(_) => {
                info!("Dropping dead subscriber {}", id);
                false
            }
        }
    });
}

impl RoomStore for MemoryStore {
    fn create_room(&self, identity: &str) -> Result<CreatedRoom, StoreError> {
        let mut rooms = self.lock()?;
        let mut room_id = new_room_code();
        while rooms.contains_key(&room_id) {
            room_id = new_room_code();
        }
        let document = RoomDocument::new(identity);
        rooms.insert(
            room_id.clone(),
            RoomEntry {
                document: document.clone(),
                subscribers: Vec::new(),
            },
        );
        info!("Created room {} for {}", room_id, identity);
        Ok(CreatedRoom { room_id, document })
    }

    fn join_room(&self, room_id: &str, identity: &str) -> Result<JoinedRoom, StoreError> {
        let mut rooms = self.lock()?;
        let entry = rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))?;

        // Rejoin: an identity that already holds a seat gets it back
        // without any document mutation.
        if let Some(color) = entry.document.seat_of(identity) {
            info!("Player {} rejoined room {} as {:?}", identity, room_id, color);
            return Ok(JoinedRoom {
                color,
                document: entry.document.clone(),
            });
        }

        if entry.document.seat_dark.is_some() {
            warn!("Player {} cannot join full room {}", identity, room_id);
            return Err(StoreError::RoomFull(room_id.to_string()));
        }

        entry.document.seat_dark = Some(identity.to_string());
        entry.document.status = RoomStatus::Playing;
        info!("Player {} joined room {} as Dark", identity, room_id);
        let document = entry.document.clone();
        notify(entry);
        Ok(JoinedRoom {
            color: Color::Dark,
            document,
        })
    }

    fn publish(
        &self,
        room_id: &str,
        identity: &str,
        update: RoomUpdate,
    ) -> Result<(), StoreError> {
        let mut rooms = self.lock()?;
        let entry = rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))?;

        if entry.document.seat_of(identity).is_none() {
            warn!(
                "Rejecting write to room {} from unseated identity {}",
                room_id, identity
            );
            return Err(StoreError::IdentityConflict {
                room: room_id.to_string(),
                identity: identity.to_string(),
            });
        }

        // Merge write: seats and status are preserved.
        entry.document.board = update.board;
        entry.document.turn = update.turn;
        entry.document.winner = update.winner;
        entry.document.last_log = update.last_log;
        notify(entry);
        Ok(())
    }

    fn subscribe(&self, room_id: &str) -> Result<Subscription, StoreError> {
        let mut rooms = self.lock()?;
        let entry = rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))?;
        let (sender, receiver) = unbounded();
        let id = Uuid::new_v4();
        entry.subscribers.push((id, sender));
        info!("Subscription {} opened on room {}", id, room_id);
        Ok(Subscription {
            token: SubscriptionToken {
                room_id: room_id.to_string(),
                id,
            },
            events: Some(receiver),
        })
    }

    fn unsubscribe(&self, token: &SubscriptionToken) {
        let Ok(mut rooms) = self.rooms.lock() else {
            return;
        };
        if let Some(entry) = rooms.get_mut(&token.room_id) {
            entry.subscribers.retain(|(id, _)| *id != token.id);
            info!(
                "Subscription {} released on room {}",
                token.id, token.room_id
            );
        }
    }
}
