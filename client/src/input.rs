//! Client input sampling
//!
//! Polling a keyboard belongs to the host engine, so the client samples
//! movement keys through [`InputSource`]. The binary ships headless bot
//! sources that drive the player with scripted or random patterns.

use crate::config::BotPattern;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::Keys;

/// Provides the keys held during a physics tick
pub trait InputSource: Send {
    fn sample(&mut self, tick: u64) -> Keys;
}

/// Walks a fixed sequence of key sets, holding each for `hold_ticks`
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    steps: Vec<Keys>,
    hold_ticks: u64,
}

impl ScriptedInput {
    pub fn new(steps: Vec<Keys>, hold_ticks: u64) -> Self {
        Self {
            steps,
            hold_ticks: hold_ticks.max(1),
        }
    }

    /// Turns through all eight directions.
    pub fn circle() -> Self {
        Self::new(
            vec![
                Keys::FORWARD,
                Keys::FORWARD | Keys::RIGHT,
                Keys::RIGHT,
                Keys::RIGHT | Keys::BACKWARD,
                Keys::BACKWARD,
                Keys::BACKWARD | Keys::LEFT,
                Keys::LEFT,
                Keys::LEFT | Keys::FORWARD,
            ],
            30,
        )
    }

    /// Sprints diagonally back and forth, jumping at each turn.
    pub fn zigzag() -> Self {
        Self::new(
            vec![
                Keys::FORWARD | Keys::LEFT | Keys::SHIFT,
                Keys::FORWARD | Keys::LEFT | Keys::SPACE,
                Keys::FORWARD | Keys::RIGHT | Keys::SHIFT,
                Keys::FORWARD | Keys::RIGHT | Keys::SPACE,
                Keys::BACKWARD | Keys::LEFT | Keys::SHIFT,
                Keys::BACKWARD | Keys::LEFT | Keys::SPACE,
                Keys::BACKWARD | Keys::RIGHT | Keys::SHIFT,
                Keys::BACKWARD | Keys::RIGHT | Keys::SPACE,
            ],
            20,
        )
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self, tick: u64) -> Keys {
        if self.steps.is_empty() {
            return Keys::empty();
        }
        let index = (tick / self.hold_ticks) as usize % self.steps.len();
        self.steps[index]
    }
}

/// Presses a random key combination, changing every `hold_ticks`
#[derive(Debug, Clone)]
pub struct RandomInput {
    rng: StdRng,
    hold_ticks: u64,
    current: Keys,
}

impl RandomInput {
    pub fn new(seed: u64, hold_ticks: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            hold_ticks: hold_ticks.max(1),
            current: Keys::empty(),
        }
    }
}

impl InputSource for RandomInput {
    fn sample(&mut self, tick: u64) -> Keys {
        if tick % self.hold_ticks == 0 {
            self.current = Keys::from_bits_truncate(self.rng.gen());
        }
        self.current
    }
}

/// Counts physics ticks and asks the configured source for their keys
pub struct InputManager {
    source: Box<dyn InputSource>,
    tick: u64,
}

impl InputManager {
    pub fn new(source: Box<dyn InputSource>) -> Self {
        Self { source, tick: 0 }
    }

    pub fn from_pattern(pattern: BotPattern, seed: u64) -> Self {
        let source: Box<dyn InputSource> = match pattern {
            BotPattern::Circle => Box::new(ScriptedInput::circle()),
            BotPattern::Zigzag => Box::new(ScriptedInput::zigzag()),
            BotPattern::Random => Box::new(RandomInput::new(seed, 15)),
            BotPattern::Idle => Box::new(ScriptedInput::new(Vec::new(), 1)),
        };
        Self::new(source)
    }

    pub fn sample(&mut self) -> Keys {
        let keys = self.source.sample(self.tick);
        self.tick += 1;
        keys
    }

    pub fn ticks_sampled(&self) -> u64 {
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_holds_each_step() {
        let mut input = ScriptedInput::new(vec![Keys::LEFT, Keys::RIGHT], 3);

        let sampled: Vec<Keys> = (0..8).map(|tick| input.sample(tick)).collect();
        assert_eq!(
            sampled,
            vec![
                Keys::LEFT,
                Keys::LEFT,
                Keys::LEFT,
                Keys::RIGHT,
                Keys::RIGHT,
                Keys::RIGHT,
                Keys::LEFT,
                Keys::LEFT
            ]
        );
    }

    #[test]
    fn test_empty_script_is_idle() {
        let mut input = ScriptedInput::new(Vec::new(), 0);
        assert!(input.sample(0).is_empty());
        assert!(input.sample(100).is_empty());
    }

    #[test]
    fn test_random_input_is_reproducible() {
        let mut first = RandomInput::new(7, 5);
        let mut second = RandomInput::new(7, 5);

        for tick in 0..100 {
            assert_eq!(first.sample(tick), second.sample(tick));
        }
    }

    #[test]
    fn test_random_input_holds_between_changes() {
        let mut input = RandomInput::new(3, 10);
        let held = input.sample(0);
        for tick in 1..10 {
            assert_eq!(input.sample(tick), held);
        }
    }

    #[test]
    fn test_input_manager_counts_ticks() {
        let mut manager = InputManager::from_pattern(BotPattern::Circle, 0);
        assert_eq!(manager.sample(), Keys::FORWARD);
        for _ in 0..29 {
            manager.sample();
        }
        assert_eq!(manager.sample(), Keys::FORWARD | Keys::RIGHT);
        assert_eq!(manager.ticks_sampled(), 31);
    }

    #[test]
    fn test_idle_pattern_sends_no_keys() {
        let mut manager = InputManager::from_pattern(BotPattern::Idle, 0);
        for _ in 0..10 {
            assert!(manager.sample().is_empty());
        }
    }
}
