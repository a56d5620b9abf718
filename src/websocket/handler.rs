use std::sync::Arc;

use actix::{Actor, ActorContext, Running, SpawnHandle, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use crate::game::state::GameState;
use crate::models::{AppState, ClientMessage, ServerMessage};
use crate::sync::session::SessionSync;
use crate::sync::store::{RoomStore, StoreEvent};

/// One websocket connection: a local engine instance plus the session
/// binding it to a shared room. The room subscription is registered as
/// an actor stream, so remote snapshots and client clicks interleave on
/// the same single-threaded actor context.
pub struct GameSocket {
    pub id: String,
    pub game: GameState,
    pub session: SessionSync,
    pub feed: Option<SpawnHandle>,
}

impl GameSocket {
    pub fn new(id: String, store: Arc<dyn RoomStore>) -> GameSocket {
        GameSocket {
            session: SessionSync::new(store, id.clone()),
            id,
            game: GameState::new(),
            feed: None,
        }
    }

    pub fn send(&self, ctx: &mut ws::WebsocketContext<Self>, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Failed to serialize server message: {}", e),
        }
    }
}

impl Actor for GameSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("WebSocket connection started: {}", self.id);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        // Release the room subscription so the store stops delivering.
        self.session.leave_room();
        info!("WebSocket connection closed: {}", self.id);
        Running::Stop
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for GameSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                // Do nothing for pong messages
            }
            Ok(ws::Message::Text(text)) => {
                info!("Received text message: {}", text);
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => {
                        self.handle_message(client_msg, ctx);
                    }
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        self.send(
                            ctx,
                            &ServerMessage::error(format!("Invalid message format: {}", e)),
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.send(ctx, &ServerMessage::error("Binary messages are not supported"));
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

// Room store push notifications, registered with ctx.add_stream when a
// room is opened.
impl StreamHandler<StoreEvent> for GameSocket {
    fn handle(&mut self, event: StoreEvent, ctx: &mut Self::Context) {
        match event {
            StoreEvent::Snapshot(document) => {
                match self.session.apply_snapshot(&mut self.game, &document) {
                    Ok(()) => {
                        let message = self.snapshot_message(&document);
                        self.send(ctx, &message);
                    }
                    Err(e) => {
                        // Corrupt document data ends this session; the
                        // connection itself stays up for the lobby.
                        warn!("Fatal snapshot error for {}: {}", self.id, e);
                        self.send(ctx, &ServerMessage::error(format!("Session lost: {}", e)));
                        self.close_room(ctx);
                    }
                }
            }
            StoreEvent::ConnectionLost(reason) => {
                warn!("Room connection lost for {}: {}", self.id, reason);
                let mut message = ServerMessage::error(format!("Connection lost: {}", reason));
                message.message_type = "connection_lost".to_string();
                self.send(ctx, &message);
            }
        }
    }

    fn finished(&mut self, _ctx: &mut Self::Context) {
        // The stream ends when the subscription is released. Leaving a
        // room must not tear down the websocket connection.
        info!("Room event stream finished for {}", self.id);
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let id = Uuid::new_v4().to_string();
    info!("New WebSocket connection: {}", id);

    let store: Arc<dyn RoomStore> = app_state.store.clone();
    ws::start(GameSocket::new(id, store), &req, stream)
}
