//! Hiroba chat relay server library.
//!
//! Clients connect over WebSocket, send chat events, and the server fans each
//! event out to every live connection while keeping a bounded window of recent
//! chat history in Redis for late joiners.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
