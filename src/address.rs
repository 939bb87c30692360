//! Bucket addressing: map a textual key to a bucket index.
//!
//! `ChainTable` never hashes keys itself; it asks its `Addresser` for the
//! bucket index, the same way std maps defer to a `BuildHasher`. The default
//! is `PositionWeighted`, which weights each UTF-16 code unit by its position
//! in the key.

use core::hash::BuildHasher;
use core::num::NonZeroUsize;
use std::collections::hash_map::RandomState;

/// Strategy that maps a key to a bucket index.
///
/// Implementations must be deterministic for a given `(key, buckets)` pair
/// and must return a value in `0..buckets`.
pub trait Addresser {
    fn address(&self, key: &str, buckets: NonZeroUsize) -> usize;
}

/// Position-weighted sum of UTF-16 code units, reduced modulo `buckets` at
/// every step: `h = (h + c * i) mod buckets`.
///
/// The code unit at position 0 is multiplied by 0 and never contributes, so
/// keys that differ only in their first character share an address.
pub fn position_weighted(key: &str, buckets: NonZeroUsize) -> usize {
    let n = buckets.get() as u128;
    let mut h: u128 = 0;
    for (i, c) in key.encode_utf16().enumerate() {
        h = (h + u128::from(c) * i as u128) % n;
    }
    h as usize
}

/// Polynomial rolling hash with multiplier 31: `h = (h * 31 + c) mod buckets`.
pub fn polynomial31(key: &str, buckets: NonZeroUsize) -> usize {
    let n = buckets.get() as u128;
    let mut h: u128 = 0;
    for c in key.encode_utf16() {
        h = (h * 31 + u128::from(c)) % n;
    }
    h as usize
}

/// Default addresser. See [`position_weighted`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PositionWeighted;

impl Addresser for PositionWeighted {
    #[inline]
    fn address(&self, key: &str, buckets: NonZeroUsize) -> usize {
        position_weighted(key, buckets)
    }
}

/// Every code unit contributes, including the first. Spreads keys better than
/// `PositionWeighted` but places them in different buckets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Polynomial31;

impl Addresser for Polynomial31 {
    #[inline]
    fn address(&self, key: &str, buckets: NonZeroUsize) -> usize {
        polynomial31(key, buckets)
    }
}

/// Adapts any `BuildHasher` into an addresser: `hash_one(key) mod buckets`.
///
/// With the default `RandomState` the placement differs between tables, but
/// stays fixed for the lifetime of one table.
#[derive(Clone, Debug, Default)]
pub struct Hashed<S = RandomState>(pub S);

impl<S: BuildHasher> Addresser for Hashed<S> {
    #[inline]
    fn address(&self, key: &str, buckets: NonZeroUsize) -> usize {
        (u128::from(self.0.hash_one(key)) % buckets.get() as u128) as usize
    }
}
