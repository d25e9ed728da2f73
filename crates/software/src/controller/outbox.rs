//! Provides [`Outbox`], which gathers everything bound for the synth while the [`Controller`] is handling an event,
//! so the messages can be written out once the controller has been released.

use super::{Controller, SendMidi, is_command};
use crate::midi::{MAX_USB_PACKET_SIZE, MidiBytes, to_bytes};
use tinyvec::ArrayVec;
use wmidi::MidiMessage;

/// The most messages a single inbound message can produce: the message itself when it is passed through, plus the
/// Bank Select and Program Change of a bank toggle, or the two All Notes Off of a Stop.
pub const MAX_MESSAGES_PER_EVENT: usize = 3;

/// Enough room for a full USB packet in which every message produces [`MAX_MESSAGES_PER_EVENT`].
pub const OUTBOX_CAPACITY: usize = MAX_USB_PACKET_SIZE / 4 * MAX_MESSAGES_PER_EVENT;

/// Serialized messages waiting to be written to the synth, in the order they were produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outbox {
    data: ArrayVec<[MidiBytes; OUTBOX_CAPACITY]>,
}

impl Outbox {
    /// Routes an inbound message: everything but the controller's commands is passed through to the synth, then the
    /// controller's response follows.
    pub fn receive(&mut self, controller: &mut Controller, message: &MidiMessage<'_>) {
        if !is_command(message) {
            self.forward(message);
        }
        controller.receive_midi(message, self);
    }

    /// Queues a message unchanged. System Exclusive is not supported by the synth's serial input and is skipped.
    pub fn forward(&mut self, message: &MidiMessage<'_>) {
        let Some(bytes) = to_bytes(message) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Dropping System Exclusive message, not supported by the synth");
            return;
        };
        if let Some(_dropped) = self.data.try_push(bytes) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Outbox full, dropping {:x}", _dropped.as_slice());
        }
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Removes and returns the queued messages in order.
    pub fn drain(&mut self) -> impl Iterator<Item = MidiBytes> + '_ {
        self.data.drain(..)
    }
}

impl SendMidi for Outbox {
    fn send(&mut self, message: MidiMessage<'static>) {
        self.forward(&message);
    }
}
