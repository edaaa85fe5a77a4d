//! # Dolle Shared
//!
//! Wire types shared between the bot server and the chat gateway that
//! forwards commands to it.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
