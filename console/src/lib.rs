//! Genie Console Library
//!
//! List synchronization, real-time updates and operator actions for the
//! Genie call-campaign admin backend.

pub mod actions;
pub mod app;
pub mod authn;
pub mod errors;
pub mod export;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod notify;
pub mod realtime;
pub mod render;
pub mod storage;
pub mod sync;
pub mod utils;
pub mod workers;
