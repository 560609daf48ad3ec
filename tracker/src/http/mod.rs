//! GraphQL access to the deployment platform

pub mod api;
pub mod client;
pub mod deployments;
pub mod graphql;
pub mod logs;
pub mod projects;

pub use api::PlatformApi;
pub use client::HttpClient;
