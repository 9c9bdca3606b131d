use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// In-memory stand-in for one directed network channel carrying encoded
/// frames. The reliable flavor delivers everything; the unreliable flavor
/// drops a seeded fraction. Both preserve order, so last-write-wins falls
/// out of applying frames in arrival order. This is a test double, not a
/// transport.
pub struct Link {
    queue: VecDeque<Vec<u8>>,
    drop_chance: f32,
    rng: StdRng,
    dropped: u64,
}

impl Link {
    pub fn reliable() -> Self {
        Self::unreliable(0.0, 0)
    }

    pub fn unreliable(drop_chance: f32, seed: u64) -> Self {
        Self {
            queue: VecDeque::new(),
            drop_chance,
            rng: StdRng::seed_from_u64(seed),
            dropped: 0,
        }
    }

    pub fn send(&mut self, frame: Vec<u8>) {
        if self.drop_chance > 0.0 && self.rng.random::<f32>() < self.drop_chance {
            self.dropped += 1;
            return;
        }
        self.queue.push_back(frame);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.queue.drain(..)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
