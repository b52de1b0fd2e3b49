//! Per-instance lifecycle: deciding between init, re-init and update, and
//! applying the decision through the renderer boundary.

mod action;
mod controller;

pub use action::{LifecycleAction, classify_change};
pub use controller::LifecycleController;
