//! State module for tracking per-item progress
//!
//! # Components
//!
//! - `CaptureState`: Tracks the state of an individual page capture
//!   (pending, capturing, success, error)
//! - `ItemStatus`: Final outcome of an asset download or live verification

mod capture_state;
mod item_status;

// Re-export main types
pub use capture_state::{CaptureState, InvalidTransition};
pub use item_status::ItemStatus;
