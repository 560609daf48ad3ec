//! Local HTTP server for out-of-process hosts

pub mod handlers;
pub mod serve;
pub mod state;
