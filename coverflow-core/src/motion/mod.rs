//! Scroll physics: the state machine and the easing curves it shares with
//! the tile transforms.

pub mod easing;
pub mod scroll_state;

pub use scroll_state::{ScrollState, SnapEvent};
