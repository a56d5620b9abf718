//! Galactic Chess: a pseudo-legal chess engine with a shared-room
//! synchronization layer.
//!
//! The engine implements piece-movement geometry and occupancy rules
//! only; there is no check, checkmate or stalemate detection, no
//! castling and no en passant. Capturing the enemy king ends the game.
//! Two remote clients share one authoritative room document through a
//! `RoomStore` and reconcile optimistic local moves with snapshots
//! pushed to their subscriptions.

pub mod game;
pub mod models;
pub mod routes;
pub mod sync;
pub mod websocket;
