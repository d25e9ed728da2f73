//! Conversions between raw bytes and [`MidiMessage`]s for the transports attached to the device.

use tinyvec::ArrayVec;
use wmidi::MidiMessage;

/// Size of a full-speed USB bulk packet, which carries up to sixteen four-byte USB-MIDI Event Packets.
pub const MAX_USB_PACKET_SIZE: usize = 64;

/// Serialized form of a channel or real-time message, ready to be written to the synth's serial input.
pub type MidiBytes = ArrayVec<[u8; 3]>;

/// Construct MIDI messages from data assumed to be USB-MIDI Event Packets.
///
/// Given bytes, returns an iterator over the MIDI messages therein. Packets which are truncated or which do not hold
/// a valid message are skipped.
pub fn bytes_to_midi_message_iterator(data: &[u8]) -> impl Iterator<Item = MidiMessage<'_>> {
    data.chunks(4).filter_map(|potential_packet| {
        if potential_packet.len() != 4 {
            #[cfg(feature = "defmt")]
            defmt::error!("USB-MIDI Event Packets must always be 32 bits long");
            None
        } else {
            // the zeroth byte is intentionally ignored because the Packet Header is not of interest; the remaining
            // three bytes contain the actual MIDI event
            MidiMessage::from_bytes(&potential_packet[1..]).ok()
        }
    })
}

/// Serializes a message for the synth's serial MIDI input.
///
/// Returns `None` for messages longer than three bytes (i.e., System Exclusive), which the device does not forward.
pub fn to_bytes(message: &MidiMessage<'_>) -> Option<MidiBytes> {
    if message.bytes_size() > 3 {
        return None;
    }
    let mut bytes = MidiBytes::from([0_u8; 3]);
    let len = message.copy_to_slice(&mut bytes).ok()?;
    bytes.truncate(len);
    Some(bytes)
}
