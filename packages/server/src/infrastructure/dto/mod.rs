//! Data Transfer Objects (DTOs) for the chat relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: the chat message wire format, also used for history entries
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
