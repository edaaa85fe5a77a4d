//! Database connection management and SeaORM entities.

mod connections;

pub mod entity;

pub use connections::{DatabaseConfig, connect};
