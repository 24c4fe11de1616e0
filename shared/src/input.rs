//! Movement key flags and stamped input samples

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Bit set of movement keys held during one physics tick
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Keys: u8 {
        const RIGHT = 1 << 0;
        const LEFT = 1 << 1;
        const FORWARD = 1 << 2;
        const BACKWARD = 1 << 3;
        /// Jump
        const SPACE = 1 << 4;
        /// Sprint
        const SHIFT = 1 << 5;
    }
}

/// One physics tick of player intent.
///
/// Stamps increase strictly per originating peer and are never reused; they
/// are how the server deduplicates resent inputs and how the client learns
/// which inputs have been acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSample {
    pub stamp: u32,
    pub keys: Keys,
}

impl InputSample {
    pub fn new(stamp: u32, keys: Keys) -> Self {
        Self { stamp, keys }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_combination() {
        let keys = Keys::FORWARD | Keys::RIGHT;
        assert!(keys.contains(Keys::FORWARD));
        assert!(keys.contains(Keys::RIGHT));
        assert!(!keys.contains(Keys::LEFT));
        assert!(keys.contains(Keys::FORWARD | Keys::RIGHT));
        assert_eq!(keys.bits(), 0b0000_0101);
    }

    #[test]
    fn test_keys_set_and_clear() {
        let mut keys = Keys::empty();
        assert!(keys.is_empty());

        keys.set(Keys::SHIFT, true);
        keys.insert(Keys::SPACE);
        assert!(keys.contains(Keys::SHIFT | Keys::SPACE));

        keys.set(Keys::SHIFT, false);
        assert!(!keys.contains(Keys::SHIFT));
        assert!(keys.contains(Keys::SPACE));
    }

    #[test]
    fn test_keys_from_bits_truncate() {
        let keys = Keys::from_bits_truncate(0xFF);
        assert_eq!(keys.bits(), 0b0011_1111);
    }

    #[test]
    fn test_keys_debug_lists_names() {
        let keys = Keys::LEFT | Keys::SPACE;
        let printed = format!("{:?}", keys);
        assert!(printed.contains("LEFT"));
        assert!(printed.contains("SPACE"));
        assert!(!printed.contains("RIGHT"));
    }

    #[test]
    fn test_keys_serialize_as_single_byte() {
        let bytes = bincode::serialize(&(Keys::FORWARD | Keys::SHIFT)).unwrap();
        assert_eq!(bytes, vec![0b0010_0100]);
    }

    #[test]
    fn test_input_sample_creation() {
        let sample = InputSample::new(42, Keys::BACKWARD);
        assert_eq!(sample.stamp, 42);
        assert_eq!(sample.keys, Keys::BACKWARD);
    }
}
