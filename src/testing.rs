//! Host-side fakes for unit tests.

use std::vec::Vec;

use display_interface::DisplayError;
use embedded_hal::delay::DelayNs;

use crate::error::TransportError;
use crate::transport::Transport;

/// One bus transaction seen by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(Vec<u8>),
    Data(Vec<u8>),
    Reset,
}

/// Transport that records every transaction and can be armed to fail.
pub struct RecordingTransport {
    pub events: Vec<Event>,
    limit: usize,
    attempts: usize,
    fail_at: Option<usize>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::with_limit(32)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::new(),
            limit,
            attempts: 0,
            fail_at: None,
        }
    }

    /// Fail the `n`-th transaction from now (0 = the next one) and every
    /// one after it.
    pub fn fail_from(&mut self, n: usize) {
        self.fail_at = Some(self.attempts + n);
    }

    /// Stop injecting failures.
    pub fn heal(&mut self) {
        self.fail_at = None;
    }

    /// Concatenation of every command byte sent, in order.
    pub fn command_bytes(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Command(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    /// Concatenation of every data byte sent, in order.
    pub fn data_bytes(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Data(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    pub fn data_blocks(&self) -> Vec<&[u8]> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Data(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn record(&mut self, event: Event) -> Result<(), TransportError> {
        let attempt = self.attempts;
        self.attempts += 1;
        if matches!(self.fail_at, Some(n) if attempt >= n) {
            return Err(DisplayError::BusWriteError);
        }
        self.events.push(event);
        Ok(())
    }
}

impl Transport for RecordingTransport {
    fn write_command_sequence(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.record(Event::Command(bytes.to_vec()))
    }

    fn write_data_block(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.record(Event::Data(bytes.to_vec()))
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.record(Event::Reset)
    }

    fn max_transaction_size(&self) -> usize {
        self.limit
    }
}

/// Delay that returns immediately and tallies the requested time.
#[derive(Debug, Default)]
pub struct NoopDelay {
    pub total_ns: u64,
}

impl NoopDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}
