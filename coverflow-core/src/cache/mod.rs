//! Index-keyed residency state: which items have a GPU texture and which
//! are currently being decoded or recently failed.

pub mod failed;
pub mod in_flight;
pub mod texture_cache;

pub use failed::FailedSet;
pub use in_flight::InFlightSet;
pub use texture_cache::TextureCache;
