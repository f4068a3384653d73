//! User-initiated mutations

pub mod dispatcher;
