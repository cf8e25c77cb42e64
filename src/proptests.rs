use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Re-walks the tree from the root and checks every structural invariant.
pub(crate) fn validate_tree<K: Ord + std::fmt::Debug, V>(t: &PathTree<K, V>) {
    assert_eq!(
        t.table.len(),
        t.size,
        "table entry count must match PathTree::len"
    );
    assert_eq!(t.has_root, t.table.contains(Path::ROOT), "has_root flag");
    assert_eq!(t.has_root, t.size > 0, "has_root must track emptiness");

    // No orphans: every stored non-root path hangs off a stored parent.
    for (path, _) in t.table.iter() {
        if let Some(parent) = path.parent() {
            assert!(t.table.contains(parent), "orphan entry at {path}");
        }
    }

    // Ordering: left subtree strictly below, right subtree strictly above (no duplicate keys).
    let mut reachable = 0usize;
    let mut stack: Vec<(Path, Option<&K>, Option<&K>)> = Vec::new();
    if let Some(root) = t.root_path() {
        stack.push((root, None, None));
    }
    while let Some((path, lo, hi)) = stack.pop() {
        reachable += 1;
        let key = &t.entry_at(path).key;
        if let Some(lo) = lo {
            assert!(key > lo, "{key:?} at {path} not above {lo:?}");
        }
        if let Some(hi) = hi {
            assert!(key < hi, "{key:?} at {path} not below {hi:?}");
        }
        if let Some(left) = t.child_path(path, Direction::Left) {
            stack.push((left, lo, Some(key)));
        }
        if let Some(right) = t.child_path(path, Direction::Right) {
            stack.push((right, Some(key), hi));
        }
    }
    assert_eq!(reachable, t.size, "reachable node count must match len");
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 50)]
    Insert(#[proptest(strategy = "0u16..256")] u16, u32),
    #[proptest(weight = 30)]
    Remove(#[proptest(strategy = "0u16..256")] u16),
    #[proptest(weight = 19)]
    Get(#[proptest(strategy = "0u16..256")] u16),
    #[proptest(weight = 1)]
    Clear,
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        let mut t: PathTree<u16, u32> = PathTree::new();
        let mut m: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => match t.insert(key, value) {
                    Err(Error::DepthExceeded { .. }) => {
                        prop_assert!(!m.contains_key(&key));
                    }
                    got => prop_assert_eq!(got, Ok(m.insert(key, value))),
                },
                Op::Remove(key) => {
                    let got = t.remove(&key);
                    match m.remove(&key) {
                        Some(v) => prop_assert_eq!(got, Ok(v)),
                        None if m.is_empty() => prop_assert_eq!(got, Err(Error::EmptyTree)),
                        None => prop_assert_eq!(got, Err(Error::NotFound)),
                    }
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                }
                Op::Clear => {
                    t.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        validate_tree(&t);
        let got: Vec<(u16, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&got, &expected);

        let mut traversed = Vec::new();
        t.traverse_in_order(|k, v| traversed.push((*k, *v))).unwrap();
        prop_assert_eq!(&traversed, &expected);
    }

    #[test]
    fn prop_insert_then_find(keys in prop::collection::vec(any::<i64>(), 1..200), probe in any::<i64>()) {
        let mut t: PathTree<i64, i64> = PathTree::new();
        for &k in &keys {
            if t.insert(k, k.wrapping_mul(3)).is_err() {
                continue;
            }
            prop_assert_eq!(t.get(&k), Some(&k.wrapping_mul(3)));
        }
        prop_assert_eq!(t.contains_key(&probe), t.get(&probe).is_some());

        let len = t.len();
        if let Some(&k) = keys.iter().find(|k| t.contains_key(k)) {
            t.insert(k, 0).unwrap();
            prop_assert_eq!(t.len(), len);
            prop_assert_eq!(t.get(&k), Some(&0));
            t.remove(&k).unwrap();
            prop_assert_eq!(t.len(), len - 1);
            let expected = if len == 1 { Error::EmptyTree } else { Error::NotFound };
            prop_assert_eq!(t.find(&k), Err(expected));
        }
        validate_tree(&t);
    }
}

#[test]
fn randomized_insert_remove_get() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(2);
    // One bucket to start, so every doubling step runs.
    let mut t: PathTree<u32, u64> =
        PathTree::with_config(TreeConfig::default().with_initial_capacity(1));
    let mut m: BTreeMap<u32, u64> = BTreeMap::new();

    for i in 0..50_000 {
        let op = rng.gen_range(0..100);
        let key = rng.gen_range(0..2048);
        match op {
            0..=49 => {
                let v: u64 = rng.gen();
                match t.insert(key, v) {
                    Err(Error::DepthExceeded { .. }) => assert!(!m.contains_key(&key)),
                    got => assert_eq!(got, Ok(m.insert(key, v))),
                }
            }
            50..=74 => {
                assert_eq!(t.remove(&key).ok(), m.remove(&key));
            }
            _ => {
                assert_eq!(t.get(&key), m.get(&key));
            }
        }
        if i % 5_000 == 0 {
            validate_tree(&t);
        }
    }

    assert_eq!(t.len(), m.len());
    validate_tree(&t);
    assert_eq!(t.min().ok(), m.first_key_value());
    assert_eq!(t.max().ok(), m.last_key_value());
    let got: Vec<(u32, u64)> = t.iter().map(|(k, v)| (*k, *v)).collect();
    let expected: Vec<(u32, u64)> = m.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(got, expected);
}

#[test]
fn balanced_insert_order_is_shallow() {
    fn midpoints(lo: u32, hi: u32, out: &mut Vec<u32>) {
        if lo >= hi {
            return;
        }
        let mid = lo + (hi - lo) / 2;
        out.push(mid);
        midpoints(lo, mid, out);
        midpoints(mid + 1, hi, out);
    }

    for n in [1u32, 2, 7, 100, 127, 1000] {
        let mut order = Vec::new();
        midpoints(0, n, &mut order);
        let mut t: PathTree<u32, ()> = PathTree::new();
        for &k in &order {
            t.insert(k, ()).unwrap();
        }
        let minimum = (u64::from(n) + 1).next_power_of_two().trailing_zeros() as usize;
        assert_eq!(t.len(), n as usize);
        assert!(
            t.height() <= minimum,
            "n={n}: height {} above {minimum}",
            t.height()
        );

        let mut sorted: PathTree<u32, ()> = PathTree::new();
        for k in 0..n.min(64) {
            sorted.insert(k, ()).unwrap();
        }
        assert_eq!(sorted.height(), n.min(64) as usize);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = [50, 30, 70, 20, 40, 60, 80];

    for_each_permutation(&keys, |perm| {
        let mut t: PathTree<i32, usize> = PathTree::new();
        let mut m: BTreeMap<i32, usize> = BTreeMap::new();

        for (i, k) in perm.into_iter().enumerate() {
            assert_eq!(t.insert(k, i), Ok(m.insert(k, i)));
        }

        validate_tree(&t);
        assert!((3..=7).contains(&t.height()));
        let got: Vec<(i32, usize)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(i32, usize)> = m.into_iter().collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_duplicate_insert_orders() {
    // Repeated keys in every arrangement must update in place, never add a second node.
    let keys = [3, 1, 3, 2, 1, 3, 4];

    for_each_permutation(&keys, |perm| {
        let mut t: PathTree<i32, usize> = PathTree::new();
        let mut m: BTreeMap<i32, usize> = BTreeMap::new();
        for (i, k) in perm.into_iter().enumerate() {
            assert_eq!(t.insert(k, i), Ok(m.insert(k, i)));
        }
        validate_tree(&t);
        assert_eq!(t.len(), 4);
        let got: Vec<(i32, usize)> = t.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(i32, usize)> = m.into_iter().collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = [50, 30, 70, 20, 40, 60, 80, 65];

    // Insert in a fixed order, then remove in all permutations.
    let mut base_tree: PathTree<i32, usize> = PathTree::new();
    let mut base_map: BTreeMap<i32, usize> = BTreeMap::new();
    for (i, &k) in keys.iter().enumerate() {
        assert_eq!(base_tree.insert(k, i), Ok(base_map.insert(k, i)));
    }

    for_each_permutation(&keys[..7], |perm| {
        let mut t = base_tree.clone();
        let mut m = base_map.clone();

        for k in perm {
            assert_eq!(t.remove(&k).ok(), m.remove(&k));
            assert_eq!(t.len(), m.len());
            validate_tree(&t);
            let got: Vec<i32> = t.keys().copied().collect();
            let expected: Vec<i32> = m.keys().copied().collect();
            assert_eq!(got, expected);
        }
        assert_eq!(t.remove(&65), Ok(7));
        assert!(t.is_empty());
        assert_eq!(t.root_path(), None);
    });
}
