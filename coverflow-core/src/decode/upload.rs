//! Render-thread command queue
//!
//! Decode workers never touch GPU state. They push an [`UploadCommand`]
//! carrying their private pixel copy, and the render thread drains the
//! queue once before each frame, within a per-frame upload budget.

use tokio::sync::mpsc;

use crate::provider::PixelBuffer;

/// Work marshalled onto the render thread.
#[derive(Debug)]
pub enum UploadCommand {
    /// A decoded tile ready for texture creation.
    Upload {
        generation: u64,
        index: usize,
        pixels: PixelBuffer,
    },
    /// Destroy every GPU resource owned by the renderer.
    ReleaseGpu,
}

pub type UploadSender = mpsc::UnboundedSender<UploadCommand>;

/// What the render thread did with a drained command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A texture was created; counts against the budget.
    Uploaded,
    /// Stale, out of range, or failed; free of charge.
    Dropped,
    /// A control command; free of charge.
    Control,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    pub uploaded: usize,
    pub dropped: usize,
    pub pending: usize,
}

/// Single-consumer end of the upload channel, owned by the render thread.
#[derive(Debug)]
pub struct UploadQueue {
    receiver: mpsc::UnboundedReceiver<UploadCommand>,
}

impl UploadQueue {
    pub fn channel() -> (UploadSender, UploadQueue) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, UploadQueue { receiver })
    }

    /// Commands still waiting to be applied.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Apply queued commands until `budget` uploads have been made
    /// (`0` means no limit). Whatever is left stays queued for the next
    /// frame.
    pub fn drain<F>(&mut self, budget: usize, mut apply: F) -> DrainStats
    where
        F: FnMut(UploadCommand) -> Applied,
    {
        let mut stats = DrainStats::default();
        while budget == 0 || stats.uploaded < budget {
            let Ok(command) = self.receiver.try_recv() else {
                break;
            };
            match apply(command) {
                Applied::Uploaded => stats.uploaded += 1,
                Applied::Dropped => stats.dropped += 1,
                Applied::Control => {}
            }
        }
        stats.pending = self.pending();
        if stats.pending > 0 {
            log::trace!(
                "Upload budget reached: {} applied, {} deferred",
                stats.uploaded,
                stats.pending
            );
        }
        stats
    }
}
