//! Background workers

pub mod log_poller;
pub mod tree_poller;
