//! Inbound contract with the radio-scanning collaborator

use crate::core::BeaconReading;
use std::collections::VecDeque;

/// Scanner errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// The radio is switched off
    #[error("Radio is not powered on")]
    RadioOff,
    /// A read was attempted before `start`
    #[error("Scanner is not running")]
    NotScanning,
    /// The underlying device went away
    #[error("Scanner disconnected: {0}")]
    Disconnected(String),
}

/// Result type for scanner operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Source of beacon readings.
///
/// Readings for different beacons arrive in no particular order and a beacon
/// may be silent for any number of polls.
pub trait BeaconScanner {
    /// Begin producing readings
    fn start(&mut self) -> ScanResult<()>;

    /// Stop producing readings
    fn stop(&mut self);

    fn is_scanning(&self) -> bool;

    /// Next available reading.
    /// Returns Ok(None) when nothing is pending right now.
    fn next_reading(&mut self) -> ScanResult<Option<BeaconReading>>;
}

/// Scanner that plays back a fixed list of readings in order
#[derive(Debug, Clone, Default)]
pub struct ReplayScanner {
    pending: VecDeque<BeaconReading>,
    scanning: bool,
}

impl ReplayScanner {
    pub fn new(readings: impl IntoIterator<Item = BeaconReading>) -> Self {
        Self {
            pending: readings.into_iter().collect(),
            scanning: false,
        }
    }

    pub fn push(&mut self, reading: BeaconReading) {
        self.pending.push_back(reading);
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl BeaconScanner for ReplayScanner {
    fn start(&mut self) -> ScanResult<()> {
        self.scanning = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.scanning = false;
    }

    fn is_scanning(&self) -> bool {
        self.scanning
    }

    fn next_reading(&mut self) -> ScanResult<Option<BeaconReading>> {
        if !self.scanning {
            return Err(ScanError::NotScanning);
        }
        Ok(self.pending.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_requires_start() {
        let mut scanner = ReplayScanner::new(vec![BeaconReading::new("a", -60, 0)]);
        assert_eq!(scanner.next_reading(), Err(ScanError::NotScanning));

        scanner.start().unwrap();
        assert!(scanner.is_scanning());
        assert_eq!(scanner.next_reading().unwrap().unwrap().beacon_id.as_str(), "a");
        assert_eq!(scanner.next_reading(), Ok(None));

        scanner.push(BeaconReading::new("b", -61, 1));
        assert_eq!(scanner.remaining(), 1);
        scanner.stop();
        assert_eq!(scanner.next_reading(), Err(ScanError::NotScanning));
    }
}
