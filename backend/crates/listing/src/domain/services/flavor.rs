//! Flavor Messages
//!
//! Light-hearted status lines shown while the user waits.

use platform::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlavorCategory {
    /// Analysis in progress
    Analyzing,
    /// The analysis service is still starting up
    WarmingUp,
    /// A listing was saved
    Saved,
    /// Something failed and the user may retry
    Retry,
}

const ANALYZING: &[&str] = &[
    "Taking a good look at your photo...",
    "Figuring out what this is worth...",
    "Writing a title buyers will click...",
    "Checking the details...",
];

const WARMING_UP: &[&str] = &[
    "Service warming up, hang tight...",
    "Waking up the analysis service...",
    "First request of the day takes a little longer...",
];

const SAVED: &[&str] = &["Listing saved!", "All set, your listing is ready.", "Saved. Nice find!"];

const RETRY: &[&str] = &[
    "That didn't work. Give it another go.",
    "Hiccup on our side. Try once more.",
];

impl FlavorCategory {
    /// Every message of this category
    pub fn messages(self) -> &'static [&'static str] {
        match self {
            FlavorCategory::Analyzing => ANALYZING,
            FlavorCategory::WarmingUp => WARMING_UP,
            FlavorCategory::Saved => SAVED,
            FlavorCategory::Retry => RETRY,
        }
    }
}

/// One message of `category`, chosen by `random`
pub fn pick(category: FlavorCategory, random: &mut impl RandomSource) -> &'static str {
    let messages = category.messages();
    messages[random.next_index(messages.len()) % messages.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::random::{SequenceRandom, ThreadRandom};

    #[test]
    fn test_pick_is_member_of_set() {
        let mut random = ThreadRandom;
        for category in [
            FlavorCategory::Analyzing,
            FlavorCategory::WarmingUp,
            FlavorCategory::Saved,
            FlavorCategory::Retry,
        ] {
            for _ in 0..20 {
                assert!(category.messages().contains(&pick(category, &mut random)));
            }
        }
    }

    #[test]
    fn test_pick_is_deterministic_with_sequence() {
        let mut random = SequenceRandom::new(vec![1, 5]);
        assert_eq!(pick(FlavorCategory::Saved, &mut random), SAVED[1]);
        assert_eq!(pick(FlavorCategory::Saved, &mut random), SAVED[2]);
    }
}
