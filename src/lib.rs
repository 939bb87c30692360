//! chain-table: a fixed-capacity hash table with chained buckets and a
//! pluggable, deterministic string addressing scheme.
//!
//! Internal Design:
//!
//! Summary
//! - `ChainTable<K, V, A>` owns `N` buckets, fixed at construction. Each
//!   bucket is a chain of entries kept in insertion order.
//! - An `Addresser` maps a key to a bucket index. The default,
//!   `PositionWeighted`, computes `h = (h + c * i) mod N` over the key's
//!   UTF-16 code units. The first code unit is weighted by 0 and never
//!   contributes; this placement is kept as is. `Polynomial31` and
//!   `Hashed<S>` are opt-in alternatives.
//! - Entries live in a `SlotMap`; buckets store the slot keys. `set` returns
//!   a `Handle` that can read or update the entry later without re-hashing.
//!
//! Semantics
//! - `set` always appends. Duplicate keys coexist in the same chain.
//! - `get`/`find` scan one chain and return the first exact, case-sensitive
//!   match, i.e. the earliest insert for that key. A missing key is `None`.
//! - The only failure is constructing a table with a non-positive capacity,
//!   reported as `TableError::InvalidArgument`.
//!
//! Notes and non-goals
//! - No deletion, no resizing, no rehashing. Handles never go stale.
//! - Single-threaded by API: mutation takes `&mut self`. Wrap the table in a
//!   lock to share it across threads.
//! - Logging goes through the `log` facade: `debug!` on construction and
//!   `trace!` with the address and chain length on every `set`.
//!
//! ```
//! use chain_table::ChainTable;
//!
//! let mut t = ChainTable::new(50).unwrap();
//! t.set("grapes", 10000);
//! t.set("apples", 9);
//! assert_eq!(t.get("grapes"), Some(&10000));
//! assert_eq!(t.get("apples"), Some(&9));
//! assert_eq!(t.get("missing"), None);
//! ```

pub mod address;
pub mod chain_table;
mod chain_table_proptest;
mod error;

// Public surface
pub use address::{Addresser, Hashed, Polynomial31, PositionWeighted};
pub use chain_table::{ChainTable, Handle, DEFAULT_CAPACITY};
pub use error::TableError;
