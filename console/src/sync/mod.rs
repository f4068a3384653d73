//! List synchronization: query state, fetching, debouncing and merging

pub mod controller;
pub mod debounce;
pub mod merge;
pub mod query;
