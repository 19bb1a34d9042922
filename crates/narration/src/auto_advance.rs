//! Choosing the story that follows a finished one

use fabletime_core::{AutoPlayMode, Story, StoryId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Auto-advance policy over an injectable random source
pub struct AutoAdvance<R: Rng = StdRng> {
    rng: R,
}

impl AutoAdvance<StdRng> {
    /// Shuffle seeded from the operating system
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible shuffle order
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> AutoAdvance<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Story to play after `current`
    ///
    /// Sequential wraps from the last story to the first. Shuffle picks
    /// uniformly among the other stories, or the only story when there is
    /// just one. A `current` missing from `stories` is treated as sitting
    /// before the first story.
    pub fn next<'a>(
        &mut self,
        current: &StoryId,
        mode: AutoPlayMode,
        stories: &'a [Story],
    ) -> Option<&'a Story> {
        if stories.is_empty() {
            return None;
        }

        let position = stories.iter().position(|s| &s.id == current);

        match mode {
            AutoPlayMode::Off => None,
            AutoPlayMode::Sequential => {
                let next = position.map_or(0, |i| (i + 1) % stories.len());
                stories.get(next)
            }
            AutoPlayMode::Shuffle => match position {
                _ if stories.len() == 1 => stories.first(),
                Some(current) => {
                    let mut pick = self.rng.gen_range(0..stories.len() - 1);
                    if pick >= current {
                        pick += 1;
                    }
                    stories.get(pick)
                }
                None => stories.get(self.rng.gen_range(0..stories.len())),
            },
        }
    }
}
