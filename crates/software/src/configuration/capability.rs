use bitmask_enum::bitmask;

/// Optional feature sets of the device.
///
/// Boards differ in what they are wired for: some are driven over BLE alone, some also enumerate as a USB MIDI
/// device, and some carry the pushbutton panel. Rather than maintaining a firmware per board, features are switched
/// on and off with these flags.
#[bitmask(u8)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Capability {
    /// MIDI is received from a USB host.
    Usb,
    /// The four pushbuttons are fitted.
    Buttons,
    /// Switching between General MIDI and MT-32 compatible banks is allowed, via CC 13 or button C.
    BankToggle,
}

impl Capability {
    /// Every feature of the full XIAO-SYNTH build.
    pub fn all_features() -> Self {
        Self::Usb | Self::Buttons | Self::BankToggle
    }
}
