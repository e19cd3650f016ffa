//! Shuffle order generation and queue traversal mode
//!
//! Shuffling never reorders the queue itself. It produces a permutation of
//! queue indices that navigation walks through instead of the natural order.

use rand::Rng;

/// Generate a shuffle order anchored at the current song
///
/// Returns a permutation of `0..len` whose first element is `current`, so
/// enabling shuffle keeps the current song playing and shuffles the rest.
///
/// The remaining indices are mixed with `3n` random pairwise swaps. This is
/// not a provably unbiased shuffle, which is fine for a listening order.
///
/// An empty queue yields an empty order. If `current` is out of range the
/// result is a plain shuffled permutation of `0..len`.
pub fn shuffle_order<R: Rng + ?Sized>(len: usize, current: usize, rng: &mut R) -> Vec<usize> {
    let mut rest: Vec<usize> = (0..len).filter(|&i| i != current).collect();

    let n = rest.len();
    for _ in 0..n * 3 {
        let a = rng.gen_range(0..n);
        let b = rng.gen_range(0..n);
        rest.swap(a, b);
    }

    if current >= len {
        return rest;
    }

    let mut order = Vec::with_capacity(len);
    order.push(current);
    order.extend(rest);
    order
}

/// How navigation walks the queue
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QueueMode {
    /// Natural queue order
    #[default]
    Linear,

    /// Walk `order`, currently at `order[position]`
    Shuffled { order: Vec<usize>, position: usize },
}

impl QueueMode {
    /// Enter shuffle mode anchored at `current`
    pub fn shuffled<R: Rng + ?Sized>(len: usize, current: usize, rng: &mut R) -> Self {
        Self::Shuffled {
            order: shuffle_order(len, current, rng),
            position: 0,
        }
    }

    pub fn is_shuffled(&self) -> bool {
        matches!(self, Self::Shuffled { .. })
    }
}
