use crate::{
    button::{BUTTON_CHANNEL, Button, ButtonAction, Edge},
    configuration::{BankMode, Capability, CycleConfig, Reverb},
};
use wmidi::{Channel, ControlFunction, ControlValue, MidiMessage, ProgramNumber, U7};

mod channel_programs;
pub use channel_programs::*;

mod outbox;
pub use outbox::*;

/// CC 13: selects the other bank and reloads the channel's program.
pub const BANK_TOGGLE: ControlFunction = ControlFunction(U7::from_u8_lossy(13));
/// CC 14: steps the channel to the previous program.
pub const PROGRAM_DOWN: ControlFunction = ControlFunction(U7::from_u8_lossy(14));
/// CC 15: steps the channel to the next program.
pub const PROGRAM_UP: ControlFunction = ControlFunction(U7::from_u8_lossy(15));

/// Reverb is device-wide; its send level is always addressed to this channel.
pub const REVERB_CHANNEL: Channel = Channel::Ch1;

/// Channels silenced when the host stops playback, addressed by index: 0 and 10.
pub const STOP_CHANNELS: [Channel; 2] = [Channel::Ch1, Channel::Ch11];

/// Returns `true` for the controllers the [`Controller`] treats as commands (CC 13 to 15). These are consumed by the
/// device instead of being passed on to the synth.
pub fn is_command(message: &MidiMessage<'_>) -> bool {
    matches!(
        message,
        MidiMessage::ControlChange(_, BANK_TOGGLE | PROGRAM_DOWN | PROGRAM_UP, _)
    )
}

/// Destination for the messages the [`Controller`] generates.
///
/// Delivery is fire-and-forget; implementations own any buffering and decide what to do when the transport is
/// unavailable.
pub trait SendMidi {
    /// Hands a message to the transport.
    fn send(&mut self, message: MidiMessage<'static>);
}

/// Tracks the program selected on each channel along with the device-wide bank and reverb settings, and translates
/// inbound MIDI and button presses into messages for the synth.
///
/// Handlers run to completion and never fail: out-of-range steps are refused, and unrecognized controllers or
/// message types are ignored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Controller {
    capabilities: Capability,
    programs: ChannelPrograms,
    bank_mode: BankMode,
    reverb: Reverb,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(Capability::all_features())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Controller {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "Controller {{ capabilities: {}, programs: {}, bank_mode: {}, reverb: {} }}",
            self.capabilities,
            self.programs,
            self.bank_mode,
            self.reverb
        );
    }
}

impl Controller {
    /// Constructs a [`Controller`] with every channel on program 0, the General MIDI bank selected and reverb off.
    pub fn new(capabilities: Capability) -> Self {
        Self {
            capabilities,
            programs: ChannelPrograms::new(),
            bank_mode: BankMode::default(),
            reverb: Reverb::default(),
        }
    }

    /// Returns the program selected on `channel`.
    pub fn program(&self, channel: Channel) -> ProgramNumber {
        self.programs.get(channel)
    }

    /// Getter.
    pub fn bank_mode(&self) -> BankMode {
        self.bank_mode
    }

    /// Returns `true` if reverb is switched on.
    pub fn reverb_enabled(&self) -> bool {
        self.reverb.is_enabled()
    }

    /// Sends the program of the button channel so the synth starts out on a known patch.
    pub fn announce(&self, out: &mut impl SendMidi) {
        out.send(MidiMessage::ProgramChange(
            BUTTON_CHANNEL,
            self.program(BUTTON_CHANNEL),
        ));
    }

    /// Selects the next program on `channel`. Nothing is sent when already on program 127.
    pub fn increment_program(&mut self, channel: Channel, out: &mut impl SendMidi) {
        if let Some(program) = self.programs.increment(channel) {
            out.send(MidiMessage::ProgramChange(channel, program));
        }
    }

    /// Selects the previous program on `channel`. Nothing is sent when already on program 0.
    pub fn decrement_program(&mut self, channel: Channel, out: &mut impl SendMidi) {
        if let Some(program) = self.programs.decrement(channel) {
            out.send(MidiMessage::ProgramChange(channel, program));
        }
    }

    /// Switches to the other bank, then resends the program on `channel` so the synth reloads the patch from the
    /// newly selected bank.
    pub fn toggle_bank(&mut self, channel: Channel, out: &mut impl SendMidi) {
        self.bank_mode = self.bank_mode.cycle();
        out.send(MidiMessage::ControlChange(
            channel,
            ControlFunction::BANK_SELECT,
            self.bank_mode.bank_select_value(),
        ));
        out.send(MidiMessage::ProgramChange(channel, self.program(channel)));
    }

    /// Switches reverb on or off. The send level always goes to [`REVERB_CHANNEL`].
    pub fn toggle_reverb(&mut self, out: &mut impl SendMidi) {
        self.reverb = self.reverb.cycle();
        out.send(MidiMessage::ControlChange(
            REVERB_CHANNEL,
            ControlFunction::EFFECTS_1_DEPTH,
            self.reverb.send_level(),
        ));
    }

    /// Handles an inbound Control Change.
    ///
    /// Momentary controllers send a non-zero value on press and zero on release; only the press acts.
    pub fn on_control_change(
        &mut self,
        channel: Channel,
        control_function: ControlFunction,
        value: ControlValue,
        out: &mut impl SendMidi,
    ) {
        if value == U7::MIN {
            return;
        }
        match control_function {
            PROGRAM_DOWN => self.decrement_program(channel, out),
            PROGRAM_UP => self.increment_program(channel, out),
            BANK_TOGGLE if self.capabilities.contains(Capability::BankToggle) => {
                self.toggle_bank(channel, out)
            }
            _ => {}
        }
    }

    /// Handles an inbound Program Change by recording it. The synth hears the inbound message itself, so nothing is sent.
    pub fn on_program_change(&mut self, channel: Channel, program: ProgramNumber) {
        self.programs.set(channel, program);
    }

    /// Handles a button transition. Buttons act when pressed, i.e., on the [`Edge::Falling`].
    pub fn on_button_edge(&mut self, button: Button, edge: Edge, out: &mut impl SendMidi) {
        if edge != Edge::Falling || !self.capabilities.contains(Capability::Buttons) {
            return;
        }
        match button.action() {
            ButtonAction::DecrementProgram => self.decrement_program(BUTTON_CHANNEL, out),
            ButtonAction::IncrementProgram => self.increment_program(BUTTON_CHANNEL, out),
            ButtonAction::ToggleBank => {
                if self.capabilities.contains(Capability::BankToggle) {
                    self.toggle_bank(BUTTON_CHANNEL, out)
                }
            }
            ButtonAction::ToggleReverb => self.toggle_reverb(out),
        }
    }

    /// Dispatches an inbound message to the matching handler.
    ///
    /// Besides Control Change and Program Change, only Stop is acted upon: it silences [`STOP_CHANNELS`]. Everything
    /// else is left to reach the synth unchanged.
    pub fn receive_midi(&mut self, message: &MidiMessage<'_>, out: &mut impl SendMidi) {
        match *message {
            MidiMessage::ControlChange(channel, control_function, value) => {
                #[cfg(feature = "defmt")]
                defmt::info!(
                    "Received Control Change {} on channel {}, value: {}",
                    u8::from(control_function),
                    channel.number(),
                    u8::from(value)
                );
                self.on_control_change(channel, control_function, value, out);
            }
            MidiMessage::ProgramChange(channel, program) => {
                #[cfg(feature = "defmt")]
                defmt::info!(
                    "Received Program Change: channel {}, program {}",
                    channel.number(),
                    u8::from(program)
                );
                self.on_program_change(channel, program);
            }
            MidiMessage::Stop => {
                #[cfg(feature = "defmt")]
                defmt::info!("Received Stop, silencing channels");
                for channel in STOP_CHANNELS {
                    out.send(MidiMessage::ControlChange(
                        channel,
                        ControlFunction::ALL_NOTES_OFF,
                        U7::MIN,
                    ));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::to_bytes;
    use std::vec::Vec;
    use wmidi::Note;

    #[derive(Default)]
    struct Recorder(Vec<MidiMessage<'static>>);

    impl SendMidi for Recorder {
        fn send(&mut self, message: MidiMessage<'static>) {
            self.0.push(message);
        }
    }

    fn u7(value: u8) -> U7 {
        U7::from_u8_lossy(value)
    }

    fn controller_on(channel: Channel, program: u8) -> Controller {
        let mut controller = Controller::default();
        controller.on_program_change(channel, u7(program));
        controller
    }

    mod program {
        use super::*;

        #[test]
        fn increment_below_ceiling() {
            for channel in (0..16).map(|i| Channel::from_index(i).unwrap()) {
                for n in 0..127 {
                    let mut controller = controller_on(channel, n);
                    let mut out = Recorder::default();
                    controller.increment_program(channel, &mut out);
                    assert_eq!(u7(n + 1), controller.program(channel));
                    assert_eq!(
                        std::vec![MidiMessage::ProgramChange(channel, u7(n + 1))],
                        out.0,
                        "Expected left but got right"
                    );
                }
            }
        }

        #[test]
        fn increment_at_ceiling_is_noop() {
            let mut controller = controller_on(Channel::Ch4, 127);
            let mut out = Recorder::default();
            controller.increment_program(Channel::Ch4, &mut out);
            assert_eq!(u7(127), controller.program(Channel::Ch4));
            assert!(out.0.is_empty(), "Nothing should be sent at the ceiling");
        }

        #[test]
        fn decrement_above_floor() {
            let mut controller = controller_on(Channel::Ch7, 42);
            let mut out = Recorder::default();
            controller.decrement_program(Channel::Ch7, &mut out);
            assert_eq!(u7(41), controller.program(Channel::Ch7));
            assert_eq!(
                std::vec![MidiMessage::ProgramChange(Channel::Ch7, u7(41))],
                out.0,
                "Expected left but got right"
            );
        }

        #[test]
        fn decrement_at_floor_is_noop() {
            let mut controller = Controller::default();
            let mut out = Recorder::default();
            controller.decrement_program(Channel::Ch1, &mut out);
            assert_eq!(u7(0), controller.program(Channel::Ch1));
            assert!(out.0.is_empty(), "Nothing should be sent at the floor");
        }

        #[test]
        fn inbound_program_change_is_recorded_not_resent() {
            let mut controller = Controller::default();
            let mut out = Recorder::default();
            controller.receive_midi(
                &MidiMessage::ProgramChange(Channel::Ch3, u7(80)),
                &mut out,
            );
            assert_eq!(u7(80), controller.program(Channel::Ch3));
            assert!(out.0.is_empty(), "Program Change should not be echoed");
        }

        #[test]
        fn announce_sends_button_channel_program() {
            let controller = controller_on(Channel::Ch1, 5);
            let mut out = Recorder::default();
            controller.announce(&mut out);
            assert_eq!(
                std::vec![MidiMessage::ProgramChange(Channel::Ch1, u7(5))],
                out.0,
                "Expected left but got right"
            );
        }
    }

    mod bank {
        use super::*;

        #[test]
        fn toggle_twice_restores_mode() {
            let mut controller = controller_on(Channel::Ch6, 33);
            let mut out = Recorder::default();

            controller.toggle_bank(Channel::Ch6, &mut out);
            assert_eq!(BankMode::Mt32Compatible, controller.bank_mode());
            assert_eq!(
                std::vec![
                    MidiMessage::ControlChange(Channel::Ch6, ControlFunction::BANK_SELECT, u7(127)),
                    MidiMessage::ProgramChange(Channel::Ch6, u7(33)),
                ],
                out.0,
                "Expected left but got right"
            );

            out.0.clear();
            controller.toggle_bank(Channel::Ch6, &mut out);
            assert_eq!(BankMode::GeneralMidi, controller.bank_mode());
            assert_eq!(
                std::vec![
                    MidiMessage::ControlChange(Channel::Ch6, ControlFunction::BANK_SELECT, u7(0)),
                    MidiMessage::ProgramChange(Channel::Ch6, u7(33)),
                ],
                out.0,
                "Expected left but got right"
            );
            assert_eq!(u7(33), controller.program(Channel::Ch6));
        }

        #[test]
        fn cc13_toggles_bank() {
            let mut controller = Controller::default();
            let mut out = Recorder::default();
            controller.on_control_change(Channel::Ch2, BANK_TOGGLE, u7(127), &mut out);
            assert_eq!(BankMode::Mt32Compatible, controller.bank_mode());
            assert_eq!(2, out.0.len());
        }

        #[test]
        fn cc13_ignored_without_capability() {
            let mut controller = Controller::new(Capability::Usb | Capability::Buttons);
            let mut out = Recorder::default();
            controller.on_control_change(Channel::Ch2, BANK_TOGGLE, u7(127), &mut out);
            controller.on_button_edge(Button::C, Edge::Falling, &mut out);
            assert_eq!(BankMode::GeneralMidi, controller.bank_mode());
            assert!(out.0.is_empty(), "Bank toggle should be disabled");
        }
    }

    mod reverb {
        use super::*;

        #[test]
        fn toggle_targets_first_channel() {
            let mut controller = controller_on(Channel::Ch5, 12);
            let mut out = Recorder::default();

            controller.toggle_reverb(&mut out);
            assert!(controller.reverb_enabled());
            assert_eq!(
                std::vec![MidiMessage::ControlChange(
                    Channel::Ch1,
                    ControlFunction::EFFECTS_1_DEPTH,
                    u7(96)
                )],
                out.0,
                "Expected left but got right"
            );

            out.0.clear();
            controller.toggle_reverb(&mut out);
            assert!(!controller.reverb_enabled());
            assert_eq!(
                std::vec![MidiMessage::ControlChange(
                    Channel::Ch1,
                    ControlFunction::EFFECTS_1_DEPTH,
                    u7(0)
                )],
                out.0,
                "Expected left but got right"
            );
        }
    }

    mod control_change {
        use super::*;

        #[test]
        fn zero_value_is_ignored() {
            let mut controller = controller_on(Channel::Ch1, 10);
            let mut out = Recorder::default();
            controller.on_control_change(Channel::Ch1, PROGRAM_DOWN, u7(0), &mut out);
            controller.on_control_change(Channel::Ch1, PROGRAM_UP, u7(0), &mut out);
            controller.on_control_change(Channel::Ch1, BANK_TOGGLE, u7(0), &mut out);
            assert_eq!(u7(10), controller.program(Channel::Ch1));
            assert_eq!(BankMode::GeneralMidi, controller.bank_mode());
            assert!(out.0.is_empty(), "Release half should not act");
        }

        #[test]
        fn cc14_decrements() {
            let mut controller = controller_on(Channel::Ch9, 10);
            let mut out = Recorder::default();
            controller.on_control_change(Channel::Ch9, PROGRAM_DOWN, u7(1), &mut out);
            assert_eq!(u7(9), controller.program(Channel::Ch9));
            assert_eq!(
                std::vec![MidiMessage::ProgramChange(Channel::Ch9, u7(9))],
                out.0,
                "Expected left but got right"
            );
        }

        #[test]
        fn unknown_controller_is_ignored() {
            let mut controller = controller_on(Channel::Ch1, 10);
            let mut out = Recorder::default();
            controller.on_control_change(
                Channel::Ch1,
                ControlFunction(u7(7)),
                u7(100),
                &mut out,
            );
            assert_eq!(u7(10), controller.program(Channel::Ch1));
            assert!(out.0.is_empty(), "Volume is passed through, not handled");
        }
    }

    mod buttons {
        use super::*;

        #[test]
        fn act_on_falling_edge_only() {
            let mut controller = controller_on(Channel::Ch1, 10);
            let mut out = Recorder::default();
            controller.on_button_edge(Button::B, Edge::Rising, &mut out);
            assert!(out.0.is_empty(), "Release should not act");

            controller.on_button_edge(Button::B, Edge::Falling, &mut out);
            assert_eq!(u7(11), controller.program(Channel::Ch1));

            controller.on_button_edge(Button::A, Edge::Falling, &mut out);
            controller.on_button_edge(Button::A, Edge::Falling, &mut out);
            assert_eq!(u7(9), controller.program(Channel::Ch1));
            assert_eq!(
                std::vec![
                    MidiMessage::ProgramChange(Channel::Ch1, u7(11)),
                    MidiMessage::ProgramChange(Channel::Ch1, u7(10)),
                    MidiMessage::ProgramChange(Channel::Ch1, u7(9)),
                ],
                out.0,
                "Expected left but got right"
            );
        }

        #[test]
        fn always_act_on_first_channel() {
            let mut controller = controller_on(Channel::Ch3, 50);
            let mut out = Recorder::default();
            controller.on_button_edge(Button::C, Edge::Falling, &mut out);
            assert_eq!(
                std::vec![
                    MidiMessage::ControlChange(Channel::Ch1, ControlFunction::BANK_SELECT, u7(127)),
                    MidiMessage::ProgramChange(Channel::Ch1, u7(0)),
                ],
                out.0,
                "Expected left but got right"
            );
            assert_eq!(u7(50), controller.program(Channel::Ch3));
        }

        #[test]
        fn ignored_without_capability() {
            let mut controller = Controller::new(Capability::Usb | Capability::BankToggle);
            let mut out = Recorder::default();
            for button in [Button::A, Button::B, Button::C, Button::D] {
                controller.on_button_edge(button, Edge::Falling, &mut out);
            }
            assert!(out.0.is_empty(), "Buttons should be disabled");
            assert!(!controller.reverb_enabled());
        }
    }

    mod dispatch {
        use super::*;

        #[test]
        fn stop_silences_channels() {
            let mut controller = Controller::default();
            let mut out = Recorder::default();
            controller.receive_midi(&MidiMessage::Stop, &mut out);
            assert_eq!(
                std::vec![
                    MidiMessage::ControlChange(Channel::Ch1, ControlFunction::ALL_NOTES_OFF, u7(0)),
                    MidiMessage::ControlChange(Channel::Ch11, ControlFunction::ALL_NOTES_OFF, u7(0)),
                ],
                out.0,
                "Expected left but got right"
            );
        }

        #[test]
        fn stop_addresses_channel_indices_0_and_10() {
            let mut controller = Controller::default();
            let mut out = Recorder::default();
            controller.receive_midi(&MidiMessage::Stop, &mut out);
            let status_bytes: Vec<u8> = out
                .0
                .iter()
                .map(|message| to_bytes(message).expect("control change should fit")[0])
                .collect();
            assert_eq!(
                std::vec![0xB0_u8, 0xBA],
                status_bytes,
                "Expected left but got right"
            );
        }

        #[test]
        fn commands_are_recognized() {
            assert!(is_command(&MidiMessage::ControlChange(
                Channel::Ch4,
                PROGRAM_UP,
                u7(1)
            )));
            assert!(is_command(&MidiMessage::ControlChange(
                Channel::Ch4,
                BANK_TOGGLE,
                u7(0)
            )));
            assert!(!is_command(&MidiMessage::ControlChange(
                Channel::Ch4,
                ControlFunction(u7(7)),
                u7(100)
            )));
            assert!(!is_command(&MidiMessage::ProgramChange(Channel::Ch4, u7(3))));
        }

        #[test]
        fn notes_are_not_handled() {
            let mut controller = Controller::default();
            let before = controller;
            let mut out = Recorder::default();
            controller.receive_midi(
                &MidiMessage::NoteOn(Channel::Ch1, Note::C4, u7(100)),
                &mut out,
            );
            controller.receive_midi(
                &MidiMessage::NoteOff(Channel::Ch1, Note::C4, u7(0)),
                &mut out,
            );
            assert_eq!(before, controller, "State should be unchanged");
            assert!(out.0.is_empty(), "Notes are passed through, not handled");
        }

        #[test]
        fn increment_then_reverb_scenario() {
            let mut controller = controller_on(Channel::Ch2, 10);
            let mut out = Recorder::default();

            controller.receive_midi(
                &MidiMessage::ControlChange(Channel::Ch2, PROGRAM_UP, u7(64)),
                &mut out,
            );
            assert_eq!(u7(11), controller.program(Channel::Ch2));

            controller.on_button_edge(Button::D, Edge::Falling, &mut out);
            assert!(controller.reverb_enabled());
            assert_eq!(u7(11), controller.program(Channel::Ch2));
            assert_eq!(
                std::vec![
                    MidiMessage::ProgramChange(Channel::Ch2, u7(11)),
                    MidiMessage::ControlChange(Channel::Ch1, ControlFunction::EFFECTS_1_DEPTH, u7(96)),
                ],
                out.0,
                "Expected left but got right"
            );
        }
    }
}
