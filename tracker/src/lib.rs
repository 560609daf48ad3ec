//! Railtrack Library
//!
//! Tracks deployments on a GraphQL deployment platform: browses the
//! project tree, notices finished builds and streams deployment logs.

pub mod app;
pub mod cache;
pub mod client;
pub mod detect;
pub mod dispatch;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod server;
pub mod storage;
pub mod tracker;
pub mod utils;
pub mod workers;
