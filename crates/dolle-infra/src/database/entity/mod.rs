//! SeaORM entities.

pub mod generated_image;
