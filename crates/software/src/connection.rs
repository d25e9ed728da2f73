//! Tracks the transport's connection state so that the status LED is only touched when it changes.

/// Whether a MIDI host is attached.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionStatus {
    /// A host is attached.
    Connected,
    /// No host is attached.
    #[default]
    Disconnected,
}

impl ConnectionStatus {
    /// Level to drive the status LED to.
    pub fn led_on(&self) -> bool {
        *self == Self::Connected
    }
}

impl From<bool> for ConnectionStatus {
    fn from(connected: bool) -> Self {
        if connected {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }
}

/// Mirrors the transport's connection signal.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct ConnectionIndicator {
    status: ConnectionStatus,
}

impl ConnectionIndicator {
    /// Records the transport's current connection signal. Returns the new status only on a transition.
    pub fn update(&mut self, connected: bool) -> Option<ConnectionStatus> {
        let status = ConnectionStatus::from(connected);
        if status == self.status {
            None
        } else {
            self.status = status;
            Some(status)
        }
    }
}
