//! Domain models for the entities shown by the console

pub mod bot;
pub mod call;
pub mod campaign;
pub mod consumer;
pub mod entity;
pub mod lead;
pub mod page;
