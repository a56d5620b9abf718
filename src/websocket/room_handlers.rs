use actix::AsyncContext;
use actix_web_actors::ws;
use log::{info, warn};

use crate::game::state::ClickOutcome;
use crate::models::{ClientMessage, ServerMessage};
use crate::sync::room::{encode_board, RoomDocument};
use crate::sync::session::SyncError;
use crate::websocket::handler::GameSocket;

impl GameSocket {
    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg.action.as_str() {
            "create" => self.handle_create(ctx),
            "join" => self.handle_join(msg, ctx),
            "click" => self.handle_click(msg, ctx),
            "reset" => self.handle_reset(ctx),
            "leave" => self.handle_leave(ctx),
            _ => {
                info!("Unknown action: {}", msg.action);
                self.send(
                    ctx,
                    &ServerMessage::error(format!("Unknown action: {}", msg.action)),
                );
            }
        }
    }

    pub fn handle_create(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        info!("Creating new room for {}", self.id);
        match self.session.create_room() {
            Ok(room_id) => {
                // A fresh room always starts from the initial position.
                self.game.reset();
                self.attach_feed(ctx);
                let mut message = self.state_message("room_created");
                message.room_id = Some(room_id);
                self.send(ctx, &message);
            }
            Err(e) => {
                warn!("Failed to create room for {}: {}", self.id, e);
                self.send(ctx, &ServerMessage::error(format!("Could not create room: {}", e)));
            }
        }
    }

    pub fn handle_join(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(room_id) = msg.room_id else {
            warn!("Join request without a room code from {}", self.id);
            self.send(ctx, &ServerMessage::error("Join requires a room code"));
            return;
        };
        info!("Player {} joining room {}", self.id, room_id);
        match self.session.join_room(&room_id) {
            Ok(joined) => {
                // Replay the current document so a rejoining player
                // recovers the board mid-game.
                if let Err(e) = self.session.apply_snapshot(&mut self.game, &joined.document) {
                    warn!("Corrupt document in room {}: {}", room_id, e);
                    self.send(ctx, &ServerMessage::error(format!("Could not join room: {}", e)));
                    self.close_room(ctx);
                    return;
                }
                self.attach_feed(ctx);
                let mut message = self.state_message("joined");
                message.status = Some(joined.document.status);
                self.send(ctx, &message);
            }
            Err(e) => {
                info!("Player {} could not join room {}: {}", self.id, room_id, e);
                self.send(ctx, &ServerMessage::error(format!("Could not join room: {}", e)));
            }
        }
    }

    pub fn handle_click(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let (Some(row), Some(col)) = (msg.row, msg.col) else {
            self.send(ctx, &ServerMessage::error("Click requires row and col"));
            return;
        };
        match self.session.handle_click(&mut self.game, row, col) {
            Ok(report) => {
                match &report.outcome {
                    ClickOutcome::Selected(square) => {
                        let mut message = self.state_message("selected");
                        message.destinations = Some(
                            self.game
                                .legal_destinations()
                                .iter()
                                .map(|s| [s.row, s.col])
                                .collect(),
                        );
                        info!(
                            "Player {} selected ({}, {})",
                            self.id, square.row, square.col
                        );
                        self.send(ctx, &message);
                    }
                    ClickOutcome::Moved(record) => {
                        let mut message = self.state_message("moved");
                        message.log_entry = Some(record.entry.clone());
                        self.send(ctx, &message);
                    }
                    ClickOutcome::InvalidSelection => {
                        self.send(ctx, &self.state_message("invalid_selection"));
                    }
                    ClickOutcome::GameOver => {
                        self.send(ctx, &self.state_message("game_over"));
                    }
                }
                if let Some(e) = report.publish_error {
                    let mut message =
                        ServerMessage::error(format!("Move applied locally but not published: {}", e));
                    message.message_type = "sync_error".to_string();
                    self.send(ctx, &message);
                }
            }
            Err(SyncError::NotYourTurn) => {
                self.send(ctx, &ServerMessage::error("Not your turn"));
            }
            Err(e) => {
                warn!("Click failed for {}: {}", self.id, e);
                self.send(ctx, &ServerMessage::error(e.to_string()));
            }
        }
    }

    pub fn handle_reset(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        info!("Player {} reset their game", self.id);
        self.game.reset();
        self.send(ctx, &self.state_message("reset"));
    }

    pub fn handle_leave(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        self.close_room(ctx);
        self.send(ctx, &ServerMessage::of_type("left_room"));
    }

    /// Registers the freshly opened subscription with the actor
    /// context, cancelling any previous room's stream first.
    pub fn attach_feed(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(handle) = self.feed.take() {
            ctx.cancel_future(handle);
        }
        if let Some(events) = self.session.take_events() {
            self.feed = Some(ctx.add_stream(events));
        }
    }

    /// Releases the subscription and cancels its actor stream.
    pub fn close_room(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(handle) = self.feed.take() {
            ctx.cancel_future(handle);
        }
        self.session.leave_room();
    }

    /// Snapshot of the local engine state for the UI.
    pub fn state_message(&self, message_type: &str) -> ServerMessage {
        ServerMessage {
            message_type: message_type.to_string(),
            room_id: self.session.room_id().map(str::to_string),
            color: self.session.seat(),
            board: Some(encode_board(self.game.board())),
            turn: Some(self.game.turn()),
            winner: self.game.winner(),
            status: None,
            destinations: None,
            log_entry: self.game.log().first().cloned(),
            error: None,
        }
    }

    /// Message pushed to the client when a remote snapshot arrives.
    pub fn snapshot_message(&self, document: &RoomDocument) -> ServerMessage {
        ServerMessage {
            message_type: "snapshot".to_string(),
            room_id: self.session.room_id().map(str::to_string),
            color: self.session.seat(),
            board: Some(document.board.clone()),
            turn: Some(document.turn),
            winner: document.winner,
            status: Some(document.status),
            destinations: None,
            log_entry: document.last_log.clone(),
            error: None,
        }
    }
}
