//! Application wiring

pub mod command;
pub mod options;
pub mod run;
pub mod state;
pub mod watch;
