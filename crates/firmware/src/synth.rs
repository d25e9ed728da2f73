//! Tasks and types related to the SAM2695 synthesizer attached to the serial port.

use defmt::{debug, error};
use embassy_stm32::{mode::Async, usart::UartTx};
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Channel, Receiver, Sender},
};
use xiao_synth_lib::{
    controller::{OUTBOX_CAPACITY, Outbox},
    midi::MidiBytes,
};

/// The SAM2695 listens at the standard MIDI DIN rate.
pub const SYNTH_BAUD_RATE: u32 = 31_250;

const SYNTH_QUEUE_LEN: usize = OUTBOX_CAPACITY;
/// Messages waiting to be written to the synth.
pub static SYNTH_QUEUE: Channel<CriticalSectionRawMutex, MidiBytes, SYNTH_QUEUE_LEN> =
    Channel::new();
pub type SynthSender<'a> = Sender<'a, CriticalSectionRawMutex, MidiBytes, SYNTH_QUEUE_LEN>;
pub type SynthReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, MidiBytes, SYNTH_QUEUE_LEN>;

/// Handle for queueing messages to the synth. Cheap to create; each task holds its own.
pub struct Synth {
    queue: SynthSender<'static>,
}

impl Default for Synth {
    fn default() -> Self {
        Self {
            queue: SYNTH_QUEUE.sender(),
        }
    }
}

impl Synth {
    /// Moves everything in the [`Outbox`] onto the queue, waiting for room rather than dropping messages.
    ///
    /// Must not be called while the controller is locked, or a slow serial line would stall every other input.
    pub async fn flush(&self, outbox: &mut Outbox) {
        for bytes in outbox.drain() {
            self.queue.send(bytes).await;
        }
    }
}

/// Task responsible for writing queued messages to the synth's serial input.
#[embassy_executor::task]
pub async fn synth_task(mut uart: UartTx<'static, Async>, queue: SynthReceiver<'static>) -> ! {
    loop {
        let bytes = queue.receive().await;
        debug!("Sending {:x} to synth", bytes.as_slice());
        if let Err(e) = uart.write(bytes.as_slice()).await {
            error!("Failed to write to synth: {}", e);
        }
    }
}
