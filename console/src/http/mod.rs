//! Backend HTTP API

pub mod auth;
pub mod backend;
pub mod bots;
pub mod calls;
pub mod campaigns;
pub mod client;
pub mod collections;
pub mod leads;
pub mod response;
