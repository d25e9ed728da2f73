//! Provides a struct [`ChannelPrograms`] recording the program last selected on each MIDI channel.

use wmidi::{Channel, ProgramNumber, U7};

/// MIDI 1.0 defines sixteen channels.
const CHANNEL_CNT: usize = 16;

/// The program last selected on each channel.
///
/// Programs are stored as [`U7`], so they can never leave the range 0 to 127. Stepping past either end is refused
/// rather than wrapped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelPrograms {
    data: [ProgramNumber; CHANNEL_CNT],
}

impl Default for ChannelPrograms {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ChannelPrograms {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "ChannelPrograms {{ data: [");
        for (i, &program) in self.data.iter().enumerate() {
            if i != 0 {
                defmt::write!(fmt, ",");
            }
            defmt::write!(fmt, " {}", u8::from(program));
        }
        defmt::write!(fmt, " ] }}");
    }
}

impl ChannelPrograms {
    /// Constructs a new `ChannelPrograms` with every channel on program 0.
    pub fn new() -> Self {
        Self {
            data: [U7::MIN; CHANNEL_CNT],
        }
    }

    /// Returns the program selected on `channel`.
    pub fn get(&self, channel: Channel) -> ProgramNumber {
        self.data[usize::from(channel.index())]
    }

    /// Records `program` as selected on `channel`.
    pub fn set(&mut self, channel: Channel, program: ProgramNumber) {
        self.data[usize::from(channel.index())] = program;
    }

    /// Advances `channel` to the next program. Returns the new program, or `None` if already on the last one.
    pub fn increment(&mut self, channel: Channel) -> Option<ProgramNumber> {
        let current = u8::from(self.get(channel));
        if current >= u8::from(U7::MAX) {
            return None;
        }
        let next = U7::from_u8_lossy(current + 1);
        self.set(channel, next);
        Some(next)
    }

    /// Steps `channel` back to the previous program. Returns the new program, or `None` if already on the first one.
    pub fn decrement(&mut self, channel: Channel) -> Option<ProgramNumber> {
        let previous = u8::from(self.get(channel)).checked_sub(1)?;
        let previous = U7::from_u8_lossy(previous);
        self.set(channel, previous);
        Some(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new() {
        let programs = ChannelPrograms::new();
        assert!(
            programs.data.iter().all(|&p| p == U7::MIN),
            "Every channel should start on program 0"
        );
    }

    #[test]
    fn channels_are_independent() {
        let mut programs = ChannelPrograms::new();
        programs.set(Channel::Ch2, U7::from_u8_lossy(10));
        assert_eq!(U7::from_u8_lossy(10), programs.get(Channel::Ch2));
        assert_eq!(U7::MIN, programs.get(Channel::Ch1));
        assert_eq!(U7::MIN, programs.get(Channel::Ch3));
    }

    #[test]
    fn increment_stops_at_ceiling() {
        let mut programs = ChannelPrograms::new();
        programs.set(Channel::Ch16, U7::MAX);
        assert_eq!(None, programs.increment(Channel::Ch16));
        assert_eq!(U7::MAX, programs.get(Channel::Ch16));
    }

    #[test]
    fn decrement_stops_at_floor() {
        let mut programs = ChannelPrograms::new();
        assert_eq!(None, programs.decrement(Channel::Ch1));
        assert_eq!(U7::MIN, programs.get(Channel::Ch1));
    }

    #[test]
    fn step_both_ways() {
        let mut programs = ChannelPrograms::new();
        assert_eq!(Some(U7::from_u8_lossy(1)), programs.increment(Channel::Ch5));
        assert_eq!(Some(U7::from_u8_lossy(2)), programs.increment(Channel::Ch5));
        assert_eq!(Some(U7::from_u8_lossy(1)), programs.decrement(Channel::Ch5));
        assert_eq!(U7::from_u8_lossy(1), programs.get(Channel::Ch5));
    }
}
