//! Wire models shared between the Genie console and the Genie backend

pub mod models;
