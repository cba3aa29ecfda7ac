//! Listener events
//!
//! Events are pushed into an unbounded channel whose receiver belongs to
//! the host's dispatch loop, so emission order is delivery order.

use tokio::sync::mpsc;

use crate::motion::SnapEvent;

/// Notifications delivered to the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CarouselEvent {
    OffsetChanged(f32),
    CenteredIndexChanged(usize),
    SnapStarted(usize),
    SnapFinished(usize),
}

pub type EventReceiver = mpsc::UnboundedReceiver<CarouselEvent>;

/// One frame's worth of observations.
#[derive(Debug, Clone, Default)]
pub struct FrameObservation {
    pub snap_events: Vec<SnapEvent>,
    pub offset: f32,
    pub centered_index: Option<usize>,
    pub force: bool,
}

#[derive(Debug)]
pub struct ListenerNotifier {
    sender: mpsc::UnboundedSender<CarouselEvent>,
    epsilon: f32,
    last_offset: Option<f32>,
    last_index: Option<usize>,
}

impl ListenerNotifier {
    pub fn new(epsilon: f32) -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let notifier = Self {
            sender,
            epsilon: epsilon.max(0.0),
            last_offset: None,
            last_index: None,
        };
        (notifier, receiver)
    }

    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon.max(0.0);
    }

    /// Emit snap events in order, then offset, then centered index, each
    /// only when it changed (or when forced, for the offset).
    pub fn dispatch(&mut self, observed: FrameObservation) -> usize {
        let mut sent = 0;
        for event in observed.snap_events {
            let event = match event {
                SnapEvent::Started(index) => CarouselEvent::SnapStarted(index),
                SnapEvent::Finished(index) => {
                    CarouselEvent::SnapFinished(index)
                }
            };
            sent += self.send(event);
        }

        let offset_moved = self
            .last_offset
            .is_none_or(|last| (observed.offset - last).abs() > self.epsilon);
        if observed.force || offset_moved {
            self.last_offset = Some(observed.offset);
            sent += self.send(CarouselEvent::OffsetChanged(observed.offset));
        }

        if let Some(index) = observed.centered_index
            && self.last_index != Some(index)
        {
            self.last_index = Some(index);
            sent += self.send(CarouselEvent::CenteredIndexChanged(index));
        }
        sent
    }

    /// Forget the last dispatched values so the next frame re-announces.
    pub fn reset(&mut self) {
        self.last_offset = None;
        self.last_index = None;
    }

    fn send(&self, event: CarouselEvent) -> usize {
        // A dropped receiver means the host stopped listening.
        usize::from(self.sender.send(event).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(receiver: &mut EventReceiver) -> Vec<CarouselEvent> {
        std::iter::from_fn(|| receiver.try_recv().ok()).collect()
    }

    fn observe(offset: f32, index: usize) -> FrameObservation {
        FrameObservation {
            offset,
            centered_index: Some(index),
            ..Default::default()
        }
    }

    #[test]
    fn unchanged_values_are_not_repeated() {
        let (mut notifier, mut rx) = ListenerNotifier::new(1e-4);
        notifier.dispatch(observe(0.0, 0));
        notifier.dispatch(observe(0.00001, 0));
        notifier.dispatch(observe(0.4, 0));
        notifier.dispatch(observe(0.6, 1));
        assert_eq!(
            drain(&mut rx),
            vec![
                CarouselEvent::OffsetChanged(0.0),
                CarouselEvent::CenteredIndexChanged(0),
                CarouselEvent::OffsetChanged(0.4),
                CarouselEvent::OffsetChanged(0.6),
                CarouselEvent::CenteredIndexChanged(1),
            ]
        );
    }

    #[test]
    fn forced_offset_is_sent_even_when_unchanged() {
        let (mut notifier, mut rx) = ListenerNotifier::new(1e-4);
        notifier.dispatch(observe(2.0, 2));
        drain(&mut rx);
        notifier.dispatch(FrameObservation {
            force: true,
            ..observe(2.0, 2)
        });
        assert_eq!(drain(&mut rx), vec![CarouselEvent::OffsetChanged(2.0)]);
    }

    #[test]
    fn snap_events_precede_offset() {
        let (mut notifier, mut rx) = ListenerNotifier::new(1e-4);
        notifier.dispatch(FrameObservation {
            snap_events: vec![SnapEvent::Started(3), SnapEvent::Finished(3)],
            ..observe(3.0, 3)
        });
        assert_eq!(
            drain(&mut rx),
            vec![
                CarouselEvent::SnapStarted(3),
                CarouselEvent::SnapFinished(3),
                CarouselEvent::OffsetChanged(3.0),
                CarouselEvent::CenteredIndexChanged(3),
            ]
        );
    }
}
