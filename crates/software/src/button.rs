//! Types describing the pushbutton panel and the edges reported by its inputs.

use wmidi::Channel;

/// Every button acts on this channel, regardless of which channel the host is playing on.
pub const BUTTON_CHANNEL: Channel = Channel::Ch1;

/// The four pushbuttons on the panel, left to right.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Steps to the previous program.
    A,
    /// Steps to the next program.
    B,
    /// Switches between the General MIDI and MT-32 compatible banks.
    C,
    /// Switches reverb on and off.
    D,
}

/// What pressing a [`Button`] does.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonAction {
    /// Select the previous program on [`BUTTON_CHANNEL`].
    DecrementProgram,
    /// Select the next program on [`BUTTON_CHANNEL`].
    IncrementProgram,
    /// Switch banks and reload the program on [`BUTTON_CHANNEL`].
    ToggleBank,
    /// Switch reverb on or off.
    ToggleReverb,
}

impl Button {
    /// Returns the action bound to this button.
    pub fn action(&self) -> ButtonAction {
        match self {
            Button::A => ButtonAction::DecrementProgram,
            Button::B => ButtonAction::IncrementProgram,
            Button::C => ButtonAction::ToggleBank,
            Button::D => ButtonAction::ToggleReverb,
        }
    }
}

/// A transition of a button input.
///
/// Inputs are pulled up, so a press pulls the line low.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Released to pressed.
    Falling,
    /// Pressed to released.
    Rising,
}

/// Turns sampled button levels into [`Edge`]s.
///
/// Contact bounce is expected to have settled before a level is sampled; repeated samples of the same level produce
/// nothing, so a spurious wake-up while the button is held is not mistaken for a second press.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct EdgeDetector {
    pressed: bool,
}

impl EdgeDetector {
    /// Records the latest sample, returning the [`Edge`] if the level changed.
    pub fn update(&mut self, pressed: bool) -> Option<Edge> {
        if pressed == self.pressed {
            return None;
        }
        self.pressed = pressed;
        if pressed {
            Some(Edge::Falling)
        } else {
            Some(Edge::Rising)
        }
    }
}
