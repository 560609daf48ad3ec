//! Deployment status change detection

pub mod detector;
pub mod policy;

pub use detector::TransitionDetector;
pub use policy::{Notification, NotificationKind};
