//! Unacknowledged-input buffer
//!
//! Holds every input the client has predicted but the server has not yet
//! confirmed. The whole buffer is resent every tick, so losing any single
//! datagram costs nothing as long as a later one gets through.

use shared::InputSample;
use std::collections::VecDeque;

/// Most inputs placed in one command batch; keeps batches under the
/// datagram receive buffer during long outages.
pub const MAX_BATCH_INPUTS: usize = 256;

/// Inputs awaiting acknowledgment, oldest first, with strictly increasing stamps
#[derive(Debug, Default, Clone)]
pub struct InputBuffer {
    inputs: VecDeque<InputSample>,
    last_acknowledged: u32,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a buffer that treats everything up to `stamp` as acknowledged.
    pub fn acknowledged_through(stamp: u32) -> Self {
        Self {
            inputs: VecDeque::new(),
            last_acknowledged: stamp,
        }
    }

    /// Appends an input. Returns false, leaving the buffer untouched, if the
    /// stamp does not follow the newest buffered or acknowledged stamp.
    pub fn push(&mut self, input: InputSample) -> bool {
        let newest = self.newest_stamp().unwrap_or(self.last_acknowledged);
        if input.stamp <= newest {
            return false;
        }
        self.inputs.push_back(input);
        true
    }

    /// Drops every input with a stamp at or below `stamp`.
    pub fn acknowledge(&mut self, stamp: u32) {
        self.last_acknowledged = self.last_acknowledged.max(stamp);
        while let Some(front) = self.inputs.front() {
            if front.stamp <= stamp {
                self.inputs.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputSample> {
        self.inputs.iter()
    }

    /// Inputs to transmit this tick, oldest first.
    pub fn batch(&self) -> Vec<InputSample> {
        self.inputs.iter().take(MAX_BATCH_INPUTS).copied().collect()
    }

    pub fn last_acknowledged(&self) -> u32 {
        self.last_acknowledged
    }

    pub fn newest_stamp(&self) -> Option<u32> {
        self.inputs.back().map(|input| input.stamp)
    }

    pub fn oldest_stamp(&self) -> Option<u32> {
        self.inputs.front().map(|input| input.stamp)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}
