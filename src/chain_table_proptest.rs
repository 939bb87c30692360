#![cfg(test)]

// Property tests for ChainTable kept inside the crate so they can check
// per-chain layout against a model.

use crate::address::{Addresser, Polynomial31, PositionWeighted};
use crate::chain_table::{ChainTable, Handle};
use core::num::NonZeroUsize;
use proptest::prelude::*;

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, i32),
    Get(usize),
    GetStray(String),
    GetAll(usize),
    Mutate(usize, i32),
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<OpI>)> {
    // Small bucket counts and short keys force plenty of collisions.
    (1usize..=8, proptest::collection::vec("[a-zA-Z]{0,4}", 1..=8)).prop_flat_map(
        |(buckets, pool)| {
            let idxs: Vec<usize> = (0..pool.len()).collect();
            let idx = proptest::sample::select(idxs);
            let op = prop_oneof![
                3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Set(i, v)),
                2 => idx.clone().prop_map(OpI::Get),
                1 => "[a-zA-Z]{0,4}".prop_map(OpI::GetStray),
                1 => idx.clone().prop_map(OpI::GetAll),
                1 => (idx.clone(), -100i32..100).prop_map(|(i, d)| OpI::Mutate(i, d)),
                1 => Just(OpI::Iterate),
            ];
            proptest::collection::vec(op, 1..60)
                .prop_map(move |ops| (buckets, pool.clone(), ops))
        },
    )
}

// Model: the full insertion log. The first entry for a key is what lookups see.
fn model_get<'a>(model: &'a [(String, i32, Handle)], key: &str) -> Option<&'a (String, i32, Handle)> {
    model.iter().find(|(k, _, _)| k == key)
}

fn run<A: Addresser>(
    mut sut: ChainTable<String, i32, A>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: Vec<(String, i32, Handle)> = Vec::new();

    for op in ops {
        match op {
            OpI::Set(i, v) => {
                let k = pool[i].clone();
                let h = sut.set(k.clone(), v);
                prop_assert!(model.iter().all(|(_, _, old)| *old != h), "handles are unique");
                model.push((k, v, h));
            }
            OpI::Get(i) => {
                let k = &pool[i];
                let expected = model_get(&model, k);
                prop_assert_eq!(sut.get(k), expected.map(|(_, v, _)| v));
                prop_assert_eq!(sut.find(k), expected.map(|(_, _, h)| *h));
                prop_assert_eq!(sut.contains_key(k), expected.is_some());
            }
            OpI::GetStray(k) => {
                prop_assert_eq!(sut.get(&k), model_get(&model, &k).map(|(_, v, _)| v));
            }
            OpI::GetAll(i) => {
                let k = &pool[i];
                let got: Vec<i32> = sut.get_all(k).copied().collect();
                let want: Vec<i32> = model
                    .iter()
                    .filter(|(mk, _, _)| mk == k)
                    .map(|(_, v, _)| *v)
                    .collect();
                prop_assert_eq!(got, want);
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                match (sut.get_mut(k), model.iter_mut().find(|(mk, _, _)| mk == k)) {
                    (Some(v), Some((_, mv, _))) => {
                        *v = v.wrapping_add(d);
                        *mv = mv.wrapping_add(d);
                    }
                    (None, None) => {}
                    (a, b) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", a, b),
                }
            }
            OpI::Iterate => {
                let seen: Vec<(String, i32, Handle)> =
                    sut.iter().map(|(h, k, v)| (k.clone(), *v, h)).collect();
                prop_assert_eq!(&seen, &model);
            }
        }

        // Structural invariants after every op.
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        let mut total = 0;
        for a in 0..sut.capacity() {
            let chain: Vec<&str> = sut.chain(a).map(|(k, _)| k.as_str()).collect();
            prop_assert!(chain.iter().all(|k| sut.address(k) == a), "entry in wrong bucket");
            let want: Vec<&str> = model
                .iter()
                .filter(|(k, _, _)| sut.address(k) == a)
                .map(|(k, _, _)| k.as_str())
                .collect();
            prop_assert_eq!(chain, want);
            total += sut.chain_len(a);
        }
        prop_assert_eq!(total, model.len());
    }
    Ok(())
}

// Property: state-machine equivalence against an insertion-log model.
// Invariants exercised across random operation sequences:
// - `get`/`find`/`contains_key` resolve to the first entry set under a key.
// - `get_all` returns every value for a key in insertion order.
// - `get_mut` mutates only the first entry for a key.
// - `iter` yields every entry once, in insertion order, with its handle.
// - Each chain holds exactly the keys addressed to it, in insertion order,
//   and chain lengths sum to `len()`.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_position_weighted((buckets, pool, ops) in arb_scenario()) {
        let n = NonZeroUsize::new(buckets).unwrap();
        run(ChainTable::with_addresser(n, PositionWeighted), &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_polynomial31((buckets, pool, ops) in arb_scenario()) {
        let n = NonZeroUsize::new(buckets).unwrap();
        run(ChainTable::with_addresser(n, Polynomial31), &pool, ops)?;
    }
}
