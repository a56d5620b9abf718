use std::sync::Arc;

use futures::channel::mpsc::UnboundedReceiver;
use log::{info, warn};
use thiserror::Error;

use crate::game::board::Color;
use crate::game::state::{ClickOutcome, GameState};
use crate::sync::room::{decode_board, encode_board, normalize_room_code, DecodeError, RoomDocument, RoomUpdate};
use crate::sync::store::{JoinedRoom, RoomStore, StoreError, StoreEvent, Subscription};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("stored board data is corrupt: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a click did, plus whether publishing it to the room failed.
/// A failed publish never rolls the local move back; it only degrades
/// the session until the caller re-subscribes.
#[derive(Debug)]
pub struct ClickReport {
    pub outcome: ClickOutcome,
    pub publish_error: Option<StoreError>,
}

/// Binds one local engine instance to one shared room document. Built
/// explicitly from a store handle and a client identity; owns the
/// room's live subscription while one is open. With no room open it
/// passes clicks straight through for local play.
pub struct SessionSync {
    store: Arc<dyn RoomStore>,
    identity: String,
    room_id: Option<String>,
    seat: Option<Color>,
    subscription: Option<Subscription>,
}

impl SessionSync {
    pub fn new(store: Arc<dyn RoomStore>, identity: String) -> SessionSync {
        SessionSync {
            store,
            identity,
            room_id: None,
            seat: None,
            subscription: None,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    /// The seat color bound to this client, re-derived from every
    /// incoming snapshot.
    pub fn seat(&self) -> Option<Color> {
        self.seat
    }

    pub fn is_networked(&self) -> bool {
        self.room_id.is_some()
    }

    /// Creates a new room with this client in the light seat and opens
    /// its subscription. Returns the shareable room code.
    pub fn create_room(&mut self) -> Result<String, SyncError> {
        self.leave_room();
        let created = self.store.create_room(&self.identity)?;
        let subscription = self.store.subscribe(&created.room_id)?;
        info!(
            "Identity {} created room {}",
            self.identity, created.room_id
        );
        self.room_id = Some(created.room_id.clone());
        self.seat = Some(Color::Light);
        self.subscription = Some(subscription);
        Ok(created.room_id)
    }

    /// Joins (or rejoins) an existing room by its code and opens its
    /// subscription. Returns the assigned seat color together with the
    /// current document, which a rejoining client replays to recover
    /// mid-game state.
    pub fn join_room(&mut self, code: &str) -> Result<JoinedRoom, SyncError> {
        self.leave_room();
        let room_id = normalize_room_code(code);
        let joined = self.store.join_room(&room_id, &self.identity)?;
        let subscription = self.store.subscribe(&room_id)?;
        info!(
            "Identity {} joined room {} as {:?}",
            self.identity, room_id, joined.color
        );
        self.room_id = Some(room_id);
        self.seat = Some(joined.color);
        self.subscription = Some(subscription);
        Ok(joined)
    }

    /// Hands the subscription's event stream to the consuming task.
    pub fn take_events(&mut self) -> Option<UnboundedReceiver<StoreEvent>> {
        self.subscription
            .as_mut()
            .and_then(|subscription| subscription.take_events())
    }

    /// Releases the subscription and forgets the room. Local play
    /// continues unsynced. Safe to call with no room open.
    pub fn leave_room(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.store.unsubscribe(&subscription.token);
        }
        if let Some(room_id) = self.room_id.take() {
            info!("Identity {} left room {}", self.identity, room_id);
        }
        self.seat = None;
    }

    /// Feeds a click through the state machine and publishes any
    /// resulting move. In networked mode a click while it is not the
    /// local seat's turn is rejected before any board mutation.
    pub fn handle_click(
        &mut self,
        game: &mut GameState,
        row: usize,
        col: usize,
    ) -> Result<ClickReport, SyncError> {
        if self.is_networked() && game.winner().is_none() && self.seat != Some(game.turn()) {
            return Err(SyncError::NotYourTurn);
        }

        let outcome = game.on_square_clicked(row, col);
        let mut publish_error = None;
        if let ClickOutcome::Moved(record) = &outcome {
            if let Some(room_id) = &self.room_id {
                let update = RoomUpdate {
                    board: encode_board(game.board()),
                    turn: game.turn(),
                    winner: game.winner(),
                    last_log: Some(record.entry.clone()),
                };
                // Fire-and-forget: the optimistic local move stands
                // even when the write fails.
                if let Err(error) = self.store.publish(room_id, &self.identity, update) {
                    warn!(
                        "Failed to publish move in room {}: {}",
                        room_id, error
                    );
                    publish_error = Some(error);
                }
            }
        }
        Ok(ClickReport {
            outcome,
            publish_error,
        })
    }

    /// Applies an incoming snapshot as the authoritative state. Board,
    /// turn and winner are overwritten unconditionally; the snapshot's
    /// log entry is prepended only when its id differs from the local
    /// newest, which keeps a client's own echoed move from being
    /// logged twice. The local seat color is re-derived every time so
    /// a returning client reconstructs its assignment.
    pub fn apply_snapshot(
        &mut self,
        game: &mut GameState,
        document: &RoomDocument,
    ) -> Result<(), SyncError> {
        let board = decode_board(&document.board)?;
        game.restore(board, document.turn, document.winner);
        if let Some(entry) = &document.last_log {
            if game.latest_log_id() != Some(entry.id) {
                game.record_entry(entry.clone());
            }
        }
        self.seat = document.seat_of(&self.identity);
        Ok(())
    }
}
