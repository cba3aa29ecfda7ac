//! Off-thread artwork decoding and the hand-off back to the render thread.

pub mod scheduler;
pub mod upload;

pub use scheduler::DecodeScheduler;
pub use upload::{DrainStats, UploadCommand, UploadQueue, UploadSender};
