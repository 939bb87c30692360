//! ChainTable: fixed bucket array with chained entries and stable handles.

use crate::address::{Addresser, PositionWeighted};
use crate::error::TableError;
use core::borrow::Borrow;
use core::fmt;
use core::num::NonZeroUsize;
use log::{debug, trace};
use slotmap::{DefaultKey, SlotMap};

/// Bucket count used by `ChainTable::default()`.
pub const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(49);

/// Names one stored entry. Entries are never removed, so a handle stays
/// valid for the lifetime of the table that returned it.
///
/// A handle is only meaningful for the table that returned it. Passing it to
/// another table may resolve to an unrelated entry of that table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }

    pub fn key<'a, K, V, A>(&self, table: &'a ChainTable<K, V, A>) -> Option<&'a K> {
        table.slots.get(self.raw_handle()).map(|e| &e.key)
    }

    pub fn value<'a, K, V, A>(&self, table: &'a ChainTable<K, V, A>) -> Option<&'a V> {
        table.slots.get(self.raw_handle()).map(|e| &e.value)
    }

    pub fn value_mut<'a, K, V, A>(&self, table: &'a mut ChainTable<K, V, A>) -> Option<&'a mut V> {
        table.slots.get_mut(self.raw_handle()).map(|e| &mut e.value)
    }
}

#[derive(Clone, Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
}

fn key_str<K: Borrow<str>>(k: &K) -> &str {
    k.borrow()
}

/// Hash table over a fixed number of buckets. Colliding keys share a bucket
/// and are kept in insertion order; duplicate keys are allowed and lookups
/// return the first one inserted.
#[derive(Clone)]
pub struct ChainTable<K, V, A = PositionWeighted> {
    addresser: A,
    capacity: NonZeroUsize,
    buckets: Vec<Vec<DefaultKey>>, // per-address chains, insertion order
    slots: SlotMap<DefaultKey, Entry<K, V>>,
}

impl<K, V> ChainTable<K, V>
where
    K: Borrow<str>,
{
    /// Create a table with `capacity` buckets.
    ///
    /// Accepts any integer type; zero, negative, or values that do not fit
    /// in `usize` are rejected with `TableError::InvalidArgument`, as is a
    /// bucket count that cannot be allocated.
    pub fn new<C>(capacity: C) -> Result<Self, TableError>
    where
        C: TryInto<usize> + Copy + fmt::Debug,
    {
        let n = capacity
            .try_into()
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| TableError::capacity(capacity))?;
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(n.get())
            .map_err(|_| TableError::allocation(capacity))?;
        buckets.resize_with(n.get(), Vec::new);
        Ok(Self::from_buckets(n, PositionWeighted, buckets))
    }

    /// # Panics
    ///
    /// Panics if the bucket array cannot be allocated. Use `new` to get an
    /// error instead.
    pub fn with_buckets(capacity: NonZeroUsize) -> Self {
        Self::with_addresser(capacity, PositionWeighted)
    }
}

impl<K, V> Default for ChainTable<K, V>
where
    K: Borrow<str>,
{
    fn default() -> Self {
        Self::with_buckets(DEFAULT_CAPACITY)
    }
}

/// Iterator over entries in insertion order.
pub struct Iter<'a, K, V> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Handle, &'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(k, e)| (Handle::new(k), &e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Iterator over entries in insertion order with mutable values.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (Handle, &'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .next()
            .map(|(k, e)| (Handle::new(k), &e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Entries of a single bucket, in the order they were appended.
pub struct Chain<'a, K, V> {
    links: core::slice::Iter<'a, DefaultKey>,
    slots: &'a SlotMap<DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slots = self.slots;
        self.links
            .next()
            .and_then(|&k| slots.get(k))
            .map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.links.size_hint()
    }
}

impl<K, V, A> ChainTable<K, V, A>
where
    K: Borrow<str>,
    A: Addresser,
{
    /// # Panics
    ///
    /// Panics if the bucket array cannot be allocated.
    pub fn with_addresser(capacity: NonZeroUsize, addresser: A) -> Self {
        Self::from_buckets(capacity, addresser, vec![Vec::new(); capacity.get()])
    }

    fn from_buckets(capacity: NonZeroUsize, addresser: A, buckets: Vec<Vec<DefaultKey>>) -> Self {
        debug_assert_eq!(buckets.len(), capacity.get());
        debug!(
            "chain table: {} buckets, addresser {}",
            capacity,
            core::any::type_name::<A>()
        );
        Self {
            addresser,
            capacity,
            buckets,
            slots: SlotMap::with_key(),
        }
    }

    /// Number of buckets. Fixed at construction.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn addresser(&self) -> &A {
        &self.addresser
    }

    /// Bucket index `key` maps to, always in `0..capacity()`.
    pub fn address(&self, key: &str) -> usize {
        let n = self.capacity.get();
        let a = self.addresser.address(key, self.capacity);
        debug_assert!(a < n, "addresser returned {a} for {n} buckets");
        a % n
    }

    /// Append `(key, value)` to the key's bucket. Existing entries with the
    /// same key are left in place and keep shadowing the new one.
    pub fn set(&mut self, key: K, value: V) -> Handle {
        let address = self.address(key_str(&key));
        let k = self.slots.insert(Entry { key, value });
        let chain = &mut self.buckets[address];
        chain.push(k);
        trace!("set: address {} chain length {}", address, chain.len());
        Handle::new(k)
    }

    /// Handle of the first entry stored under `key`.
    pub fn find(&self, key: &str) -> Option<Handle> {
        self.buckets[self.address(key)]
            .iter()
            .copied()
            .find(|&k| {
                self.slots
                    .get(k)
                    .map(|e| key_str(&e.key) == key)
                    .unwrap_or(false)
            })
            .map(Handle::new)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Value of the first entry stored under `key`, or `None`.
    pub fn get(&self, key: &str) -> Option<&V> {
        let h = self.find(key)?;
        self.slots.get(h.raw_handle()).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let h = self.find(key)?;
        self.slots.get_mut(h.raw_handle()).map(|e| &mut e.value)
    }

    /// Every value stored under `key`, first inserted first.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a V> + 'a {
        self.chain(self.address(key))
            .filter(move |&(k, _)| key_str(k) == key)
            .map(|(_, v)| v)
    }

    /// Entries of the bucket at `address`. Addresses outside
    /// `0..capacity()` yield nothing.
    pub fn chain(&self, address: usize) -> Chain<'_, K, V> {
        let links = self
            .buckets
            .get(address)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Chain {
            links: links.iter(),
            slots: &self.slots,
        }
    }

    pub fn chain_len(&self, address: usize) -> usize {
        self.buckets.get(address).map_or(0, Vec::len)
    }

    pub fn longest_chain(&self) -> usize {
        self.buckets.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.slots.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.slots.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(_, k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, _, v)| v)
    }
}

impl<K, V, A> Extend<(K, V)> for ChainTable<K, V, A>
where
    K: Borrow<str>,
    A: Addresser,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<K, V, A> fmt::Debug for ChainTable<K, V, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.values().map(|e| (&e.key, &e.value)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Addresser that sends every key to one bucket.
    #[derive(Clone, Copy, Default)]
    struct ConstAddresser(usize);
    impl Addresser for ConstAddresser {
        fn address(&self, _key: &str, _buckets: NonZeroUsize) -> usize {
            self.0
        }
    }

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    /// Invariant: construction rejects zero and negative capacities and
    /// allocates exactly `capacity` empty buckets otherwise.
    #[test]
    fn construction_validates_capacity() {
        for bad in [0i64, -1, -50, i64::MIN] {
            match ChainTable::<String, i32>::new(bad) {
                Err(TableError::InvalidArgument(_)) => {}
                other => panic!("unexpected result for {bad}: {:?}", other),
            }
        }
        assert!(ChainTable::<String, i32>::new(0usize).is_err());

        let t: ChainTable<String, i32> = ChainTable::new(7u8).unwrap();
        assert_eq!(t.capacity(), 7);
        assert!(t.is_empty());
        assert!((0..7).all(|a| t.chain_len(a) == 0));
        assert_eq!(t.longest_chain(), 0);
    }

    /// Invariant: a capacity that passes validation but cannot be allocated
    /// is reported as an error, not a panic.
    #[test]
    fn unallocatable_capacity_is_an_error() {
        for huge in [usize::MAX, isize::MAX as usize] {
            match ChainTable::<String, i32>::new(huge) {
                Err(TableError::InvalidArgument(msg)) => {
                    assert!(msg.contains(&huge.to_string()), "{msg}")
                }
                other => panic!("unexpected result for {huge}: {:?}", other),
            }
        }
    }

    #[test]
    fn default_uses_fifty_buckets() {
        let t: ChainTable<&str, ()> = ChainTable::default();
        assert_eq!(t.capacity(), DEFAULT_CAPACITY.get());
        assert_eq!(t.capacity(), 50);
    }

    /// Invariant: duplicate keys coexist; `get` returns the first inserted
    /// value and `get_all` returns all of them in order.
    #[test]
    fn duplicates_are_kept_and_first_wins() {
        let mut t: ChainTable<String, i32> = ChainTable::new(50).unwrap();
        let h1 = t.set("dup".to_string(), 1);
        let h2 = t.set("dup".to_string(), 2);
        assert_ne!(h1, h2);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("dup"), Some(&1));
        assert_eq!(t.find("dup"), Some(h1));
        assert_eq!(t.get_all("dup").copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(h2.value(&t), Some(&2));
    }

    /// Invariant: handle access yields the stored key and value; mutating
    /// through `value_mut` is visible to lookups.
    #[test]
    fn handle_access_and_mutation() {
        let mut t: ChainTable<String, i32> = ChainTable::new(10).unwrap();
        let h = t.set("k1".to_string(), 10);
        assert_eq!(h.key(&t), Some(&"k1".to_string()));
        assert_eq!(h.value(&t), Some(&10));
        let new_val = h
            .value_mut(&mut t)
            .map(|v| {
                *v += 5;
                *v
            })
            .unwrap();
        assert_eq!(new_val, 15);
        assert_eq!(t.get("k1"), Some(&15));
    }

    /// Invariant: a handle resolves in the table that returned it; a table
    /// that never stored that slot yields `None`.
    #[test]
    fn handles_are_scoped_to_their_table() {
        let mut a: ChainTable<&str, i32> = ChainTable::new(8).unwrap();
        let b: ChainTable<&str, i32> = ChainTable::new(8).unwrap();
        let h = a.set("alpha", 1);
        assert_eq!(h.key(&a), Some(&"alpha"));
        assert_eq!(h.key(&b), None);
        assert_eq!(h.value(&b), None);
    }

    /// Invariant: `get_mut` only touches the first entry for a key.
    #[test]
    fn get_mut_updates_first_match_only() {
        let mut t: ChainTable<&str, i32> = ChainTable::new(3).unwrap();
        let _ = t.set("a", 1);
        let second = t.set("a", 2);
        *t.get_mut("a").unwrap() = 100;
        assert_eq!(t.get("a"), Some(&100));
        assert_eq!(second.value(&t), Some(&2));
        assert!(t.get_mut("b").is_none());
    }

    /// Invariant: lookups work when every key collides; exact key equality
    /// resolves to the right entry and the chain keeps insertion order.
    #[test]
    fn collision_handling_with_const_addresser() {
        let mut t: ChainTable<String, i32, ConstAddresser> =
            ChainTable::with_addresser(nz(4), ConstAddresser(2));
        t.set("a".to_string(), 1);
        t.set("b".to_string(), 2);
        t.set("A".to_string(), 3);

        assert_eq!(t.get("a"), Some(&1));
        assert_eq!(t.get("b"), Some(&2));
        assert_eq!(t.get("A"), Some(&3));
        assert_eq!(t.get("c"), None);
        assert_eq!(t.chain_len(2), 3);
        assert_eq!(t.longest_chain(), 3);
        let chain: Vec<(&str, i32)> = t.chain(2).map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(chain, vec![("a", 1), ("b", 2), ("A", 3)]);
        assert_eq!(t.chain(0).count(), 0);
    }

    /// Invariant: out-of-range addresses are empty rather than panicking.
    #[test]
    fn chain_out_of_range_is_empty() {
        let mut t: ChainTable<&str, i32> = ChainTable::new(5).unwrap();
        t.set("x", 1);
        assert_eq!(t.chain(5).count(), 0);
        assert_eq!(t.chain(usize::MAX).count(), 0);
        assert_eq!(t.chain_len(99), 0);
    }

    /// Invariant: keys that differ only in their first character land in
    /// the same bucket under the default addresser and are still told apart.
    #[test]
    fn first_character_collisions_resolve_by_key() {
        let mut t: ChainTable<&str, char> = ChainTable::new(50).unwrap();
        t.set("xab", 'x');
        t.set("yab", 'y');
        assert_eq!(t.address("xab"), t.address("yab"));
        assert_eq!(t.chain_len(t.address("xab")), 2);
        assert_eq!(t.get("xab"), Some(&'x'));
        assert_eq!(t.get("yab"), Some(&'y'));
    }

    /// Invariant: `len`/`is_empty` count every `set`, including duplicates,
    /// and agree with the sum of chain lengths.
    #[test]
    fn len_counts_every_set() {
        let mut t: ChainTable<String, i32> = ChainTable::new(4).unwrap();
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        for (i, k) in ["a", "b", "a", "c", "b"].iter().enumerate() {
            t.set((*k).to_string(), i as i32);
            assert_eq!(t.len(), i + 1);
        }
        assert!(!t.is_empty());
        let total: usize = (0..t.capacity()).map(|a| t.chain_len(a)).sum();
        assert_eq!(total, t.len());
    }

    /// Invariant: iteration yields every entry once in insertion order;
    /// `iter_mut` updates are seen by later lookups.
    #[test]
    fn iteration_and_mutation() {
        let mut t: ChainTable<String, i32> = ChainTable::new(3).unwrap();
        let keys = ["k1", "k2", "k3", "k4"];
        for (i, k) in keys.iter().enumerate() {
            t.set((*k).to_string(), i as i32);
        }

        let seen: Vec<&str> = t.keys().map(String::as_str).collect();
        assert_eq!(seen, keys);
        assert_eq!(t.values().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        for (h, k, v) in t.iter() {
            assert_eq!(t.find(k), Some(h));
            assert_eq!(h.value(&t), Some(v));
        }

        for (_h, _k, v) in t.iter_mut() {
            *v += 10;
        }
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(t.get(k), Some(&(i as i32 + 10)));
        }
    }

    #[test]
    fn extend_appends_in_order() {
        let mut t: ChainTable<&str, u32> = ChainTable::default();
        t.extend([("one", 1), ("two", 2), ("one", 11)]);
        assert_eq!(t.len(), 3);
        assert_eq!(t.get("one"), Some(&1));
        assert_eq!(t.get_all("one").copied().collect::<Vec<_>>(), vec![1, 11]);
    }

    #[test]
    fn debug_lists_entries_in_insertion_order() {
        let mut t: ChainTable<&str, i32> = ChainTable::new(2).unwrap();
        t.set("b", 2);
        t.set("a", 1);
        assert_eq!(format!("{:?}", t), r#"{"b": 2, "a": 1}"#);
    }

    /// Invariant (debug-only): an addresser returning an out-of-range index
    /// trips the debug assertion.
    #[cfg(debug_assertions)]
    #[test]
    fn out_of_range_addresser_panics_in_debug() {
        let t: ChainTable<&str, i32, ConstAddresser> =
            ChainTable::with_addresser(nz(4), ConstAddresser(9));
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| t.address("k")));
        assert!(res.is_err(), "expected out-of-range address to panic in debug builds");
    }

    /// Invariant (release-only): an out-of-range index is reduced modulo
    /// the bucket count.
    #[cfg(not(debug_assertions))]
    #[test]
    fn out_of_range_addresser_wraps_in_release() {
        let mut t: ChainTable<&str, i32, ConstAddresser> =
            ChainTable::with_addresser(nz(4), ConstAddresser(9));
        assert_eq!(t.address("k"), 1);
        t.set("k", 1);
        assert_eq!(t.get("k"), Some(&1));
    }
}
