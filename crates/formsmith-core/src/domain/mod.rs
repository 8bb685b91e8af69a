//! Form document model

pub mod aggregates;
pub mod events;
pub mod settings;
pub mod value_objects;
