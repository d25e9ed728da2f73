use num_derive::{FromPrimitive, ToPrimitive};
use wmidi::{ControlValue, U7};

/// Send level used when reverb is switched on.
const REVERB_ON_LEVEL: ControlValue = U7::from_u8_lossy(96);

/// Device-wide reverb setting, communicated to the synth with Reverb Send Level (CC 91).
///
/// Reverb is not tracked per channel.
#[derive(Debug, Default, Copy, Clone, ToPrimitive, FromPrimitive, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reverb {
    /// No reverb.
    #[default]
    Off,
    /// Moderate reverb.
    On,
}

impl Reverb {
    /// Returns the Reverb Send Level for this setting.
    pub fn send_level(&self) -> ControlValue {
        match self {
            Self::Off => U7::MIN,
            Self::On => REVERB_ON_LEVEL,
        }
    }

    /// Returns true for [`Reverb::On`].
    pub fn is_enabled(&self) -> bool {
        *self == Self::On
    }
}

impl super::CycleConfig for Reverb {}
