use num_derive::{FromPrimitive, ToPrimitive};
use wmidi::{ControlValue, U7};

/// Determines which of the synthesizer's instrument banks programs are loaded from.
///
/// The selection is communicated to the synth with Bank Select (CC 0). The SAM2695 keeps a second set of voices
/// modelled on the Roland MT-32; value 127 is repurposed here to reach it.
#[derive(Debug, Default, Copy, Clone, ToPrimitive, FromPrimitive, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BankMode {
    /// The standard General MIDI sound set.
    #[default]
    GeneralMidi,
    /// The MT-32 compatible sound set.
    Mt32Compatible,
}

impl BankMode {
    /// Returns the Bank Select MSB value which selects this bank.
    pub fn bank_select_value(&self) -> ControlValue {
        match self {
            Self::GeneralMidi => U7::MIN,
            Self::Mt32Compatible => U7::MAX,
        }
    }
}

impl super::CycleConfig for BankMode {}
