//! This crate contains architecture-agnostic logic for the XIAO-SYNTH, a small MIDI bridge which forwards
//! [MIDI](https://midi.org/midi-1-0) received from a host to a serial-attached SAM2695 synthesizer chip and adds four
//! pushbuttons for stepping through programs, switching between the General MIDI and MT-32 compatible banks, and
//! toggling reverb.
//!
//! The heart of the crate is the [`Controller`][`controller::Controller`], which tracks the program selected on each
//! channel along with the device-wide bank and reverb modes, and translates inbound MIDI and button presses into the
//! outbound messages that keep the synth in step.

#![deny(missing_docs)]
#![no_std]

#[cfg(test)]
extern crate std;

pub mod button;
pub mod configuration;
pub mod connection;

/// Per-channel program tracking and the event handlers which drive it.
pub mod controller;

pub mod midi;
