use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sapling_tree::OrderedMap;
use sapling_tree::ordered_map::Entry;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 10_000;

/// Generates random keys in a range small enough to cause collisions.
fn key_strategy() -> impl Strategy<Value = i64> {
    -20_000i64..20_000i64
}

fn value_strategy() -> impl Strategy<Value = i64> {
    any::<i64>()
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum MapOp {
    Insert(i64, i64),
    Remove(i64),
    Get(i64),
    ContainsKey(i64),
    GetKeyValue(i64),
    FirstKeyValue,
    LastKeyValue,
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        5 => (key_strategy(), value_strategy()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        3 => key_strategy().prop_map(MapOp::Remove),
        2 => key_strategy().prop_map(MapOp::Get),
        1 => key_strategy().prop_map(MapOp::ContainsKey),
        1 => key_strategy().prop_map(MapOp::GetKeyValue),
        1 => Just(MapOp::FirstKeyValue),
        1 => Just(MapOp::LastKeyValue),
    ]
}

// ─── Core CRUD operations ────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays a random sequence of insert/remove/get operations on both
    /// OrderedMap and BTreeMap and asserts identical results at every step.
    #[test]
    fn map_ops_match_btreemap(ops in proptest::collection::vec(map_op_strategy(), TEST_SIZE)) {
        let mut os_map: OrderedMap<i64, i64> = OrderedMap::new();
        let mut bt_map: BTreeMap<i64, i64> = BTreeMap::new();

        for op in &ops {
            match op {
                MapOp::Insert(k, v) => {
                    let os_result = os_map.insert(*k, *v);
                    let bt_result = bt_map.insert(*k, *v);
                    prop_assert_eq!(os_result, bt_result, "insert({}, {})", k, v);
                }
                MapOp::Remove(k) => {
                    let os_result = os_map.remove(k);
                    let bt_result = bt_map.remove(k);
                    prop_assert_eq!(os_result, bt_result, "remove({})", k);
                }
                MapOp::Get(k) => {
                    let os_result = os_map.get(k);
                    let bt_result = bt_map.get(k);
                    prop_assert_eq!(os_result, bt_result, "get({})", k);
                }
                MapOp::ContainsKey(k) => {
                    let os_result = os_map.contains_key(k);
                    let bt_result = bt_map.contains_key(k);
                    prop_assert_eq!(os_result, bt_result, "contains_key({})", k);
                }
                MapOp::GetKeyValue(k) => {
                    let os_result = os_map.get_key_value(k);
                    let bt_result = bt_map.get_key_value(k);
                    prop_assert_eq!(os_result, bt_result, "get_key_value({})", k);
                }
                MapOp::FirstKeyValue => {
                    let os_result = os_map.first_key_value();
                    let bt_result = bt_map.first_key_value();
                    prop_assert_eq!(os_result, bt_result, "first_key_value");
                }
                MapOp::LastKeyValue => {
                    let os_result = os_map.last_key_value();
                    let bt_result = bt_map.last_key_value();
                    prop_assert_eq!(os_result, bt_result, "last_key_value");
                }
            }
            prop_assert_eq!(os_map.len(), bt_map.len(), "len mismatch after {:?}", op);
            prop_assert_eq!(os_map.is_empty(), bt_map.is_empty(), "is_empty mismatch after {:?}", op);
        }
    }

    /// Tests that iteration order matches BTreeMap after random insertions.
    #[test]
    fn iter_matches_btreemap(entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE)) {
        let mut os_map: OrderedMap<i64, i64> = OrderedMap::new();
        let mut bt_map: BTreeMap<i64, i64> = BTreeMap::new();

        for (k, v) in &entries {
            os_map.insert(*k, *v);
            bt_map.insert(*k, *v);
        }

        // Forward iteration
        let os_items: Vec<_> = os_map.iter().map(|(&k, &v)| (k, v)).collect();
        let bt_items: Vec<_> = bt_map.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&os_items, &bt_items, "iter() mismatch");

        // Reverse iteration
        let os_rev: Vec<_> = os_map.iter().rev().map(|(&k, &v)| (k, v)).collect();
        let bt_rev: Vec<_> = bt_map.iter().rev().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&os_rev, &bt_rev, "iter().rev() mismatch");

        // Keys
        let os_keys: Vec<_> = os_map.keys().copied().collect();
        let bt_keys: Vec<_> = bt_map.keys().copied().collect();
        prop_assert_eq!(&os_keys, &bt_keys, "keys() mismatch");

        // Values
        let os_vals: Vec<_> = os_map.values().copied().collect();
        let bt_vals: Vec<_> = bt_map.values().copied().collect();
        prop_assert_eq!(&os_vals, &bt_vals, "values() mismatch");

        // into_iter
        let os_into: Vec<_> = os_map.clone().into_iter().collect();
        let bt_into: Vec<_> = bt_map.clone().into_iter().collect();
        prop_assert_eq!(&os_into, &bt_into, "into_iter() mismatch");

        // into_keys
        let os_into_keys: Vec<_> = os_map.clone().into_keys().collect();
        let bt_into_keys: Vec<_> = bt_map.clone().into_keys().collect();
        prop_assert_eq!(&os_into_keys, &bt_into_keys, "into_keys() mismatch");

        // into_values
        let os_into_vals: Vec<_> = os_map.clone().into_values().collect();
        let bt_into_vals: Vec<_> = bt_map.clone().into_values().collect();
        prop_assert_eq!(&os_into_vals, &bt_into_vals, "into_values() mismatch");
    }

    /// Tests that the visitor traversal agrees with the iterator.
    #[test]
    fn for_each_matches_iter(entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE)) {
        let os_map: OrderedMap<i64, i64> = entries.iter().copied().collect();

        let mut visited: Vec<(i64, i64)> = Vec::new();
        os_map.for_each(|&k, &v| visited.push((k, v)));

        let iterated: Vec<_> = os_map.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&visited, &iterated, "for_each() and iter() disagree");

        // Strictly ascending keys, every element exactly once.
        prop_assert!(visited.windows(2).all(|w| w[0].0 < w[1].0));
        prop_assert_eq!(visited.len(), os_map.len());
    }

    /// Tests ExactSizeIterator and DoubleEndedIterator behavior.
    #[test]
    fn iter_size_and_double_ended(entries in proptest::collection::vec((key_strategy(), value_strategy()), 1..TEST_SIZE)) {
        let os_map: OrderedMap<i64, i64> = entries.iter().cloned().collect();

        let iter = os_map.iter();
        let len = iter.len();
        prop_assert_eq!(len, os_map.len(), "ExactSizeIterator len mismatch");

        // Alternating front/back should yield all elements exactly once.
        let mut from_front = Vec::new();
        let mut from_back = Vec::new();
        let mut iter = os_map.iter();
        let mut toggle = true;
        loop {
            if toggle {
                if let Some(item) = iter.next() {
                    from_front.push(item);
                } else {
                    break;
                }
            } else if let Some(item) = iter.next_back() {
                from_back.push(item);
            } else {
                break;
            }
            toggle = !toggle;
        }
        prop_assert_eq!(from_front.len() + from_back.len(), os_map.len());

        from_back.reverse();
        from_front.extend(from_back);
        let expected: Vec<_> = os_map.iter().collect();
        prop_assert_eq!(from_front, expected, "mixed-end iteration must cover the map in order");
    }

    /// Tests that iter_mut edits land and preserve ordering.
    #[test]
    fn iter_mut_matches_btreemap(entries in proptest::collection::vec((key_strategy(), value_strategy()), TEST_SIZE)) {
        let mut os_map: OrderedMap<i64, i64> = entries.iter().copied().collect();
        let mut bt_map: BTreeMap<i64, i64> = entries.iter().copied().collect();

        for (_, value) in os_map.iter_mut() {
            *value = value.wrapping_mul(3);
        }
        for value in bt_map.values_mut() {
            *value = value.wrapping_mul(3);
        }

        let os_items: Vec<_> = os_map.iter().map(|(&k, &v)| (k, v)).collect();
        let bt_items: Vec<_> = bt_map.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(&os_items, &bt_items, "iter_mut() mismatch");

        let os_vals: Vec<_> = os_map.values_mut().map(|v| *v).collect();
        let bt_vals: Vec<_> = bt_map.values().copied().collect();
        prop_assert_eq!(&os_vals, &bt_vals, "values_mut() mismatch");
    }
}

// ─── Deterministic scenarios ─────────────────────────────────────────────────

fn visited_keys(map: &OrderedMap<i64, i64>) -> Vec<i64> {
    let mut keys = Vec::new();
    map.for_each(|&k, _| keys.push(k));
    keys
}

#[test]
fn insert_erase_scenario() {
    let mut data = OrderedMap::new();
    assert_eq!(data.len(), 0);

    data.insert(10, 10);
    data.insert(5, 5);
    data.insert(15, 15);
    data.insert(2, 2);
    data.insert(4, 4);
    data.insert(12, 12);
    data.insert(14, 14);

    assert_eq!(data.len(), 7);
    assert!(data.contains_key(&4));
    assert!(data.contains_key(&12));
    assert!(!data.contains_key(&3));
    assert!(!data.contains_key(&13));

    assert_eq!(visited_keys(&data), [2, 4, 5, 10, 12, 14, 15]);

    data.remove(&15);
    data.remove(&14);
    data.remove(&2);

    assert_eq!(data.len(), 4);
    assert!(data.contains_key(&4));
    assert!(data.contains_key(&12));
    assert!(!data.contains_key(&2));
    assert!(!data.contains_key(&14));

    assert_eq!(visited_keys(&data), [4, 5, 10, 12]);
}

#[test]
fn empty_map() {
    let map: OrderedMap<i64, i64> = OrderedMap::new();

    assert_eq!(map.len(), 0);
    assert!(map.is_empty());
    assert!(!map.contains_key(&0));
    assert_eq!(map.first_key_value(), None);
    assert_eq!(map.last_key_value(), None);
    assert_eq!(visited_keys(&map), [0i64; 0]);
    assert_eq!(map.iter().next(), None);
}

#[test]
fn reinsert_updates_value_without_size_change() {
    let mut map = OrderedMap::new();
    map.insert(1i64, 100i64);
    map.insert(2, 200);

    assert_eq!(map.insert(1, 111), Some(100));
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&1), Some(&111));

    let mut pairs = Vec::new();
    map.for_each(|&k, &v| pairs.push((k, v)));
    assert_eq!(pairs, [(1, 111), (2, 200)]);
}

#[test]
fn erase_absent_key_is_a_no_op() {
    let mut map: OrderedMap<i64, i64> = [(10, 10), (5, 5), (15, 15)].into();
    let before = visited_keys(&map);

    assert_eq!(map.remove(&42), None);

    assert_eq!(map.len(), 3);
    assert_eq!(visited_keys(&map), before);
}

#[test]
fn erase_with_two_children_preserves_ordering() {
    let mut map: OrderedMap<i64, i64> = (0..64).map(|i| (i * 7 % 64, i)).collect();
    assert_eq!(map.len(), 64);

    // 32 sits in the middle of the key space, so it has two children with
    // near certainty under this insertion order; assert the shape-independent
    // contract either way.
    assert_eq!(map.remove(&32), Some((32 * 55) % 64));

    for key in 0..64 {
        assert_eq!(map.contains_key(&key), key != 32);
    }
    let keys = visited_keys(&map);
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(keys.len(), 63);
}

#[test]
fn sorted_insertion_still_sorted() {
    // Worst-case shape: a right spine 1000 nodes deep.
    let mut map = OrderedMap::new();
    for key in 0..1_000i64 {
        map.insert(key, -key);
    }

    assert_eq!(map.len(), 1_000);
    let keys = visited_keys(&map);
    assert!(keys.iter().copied().eq(0..1_000));
    assert_eq!(map.first_key_value(), Some((&0, &0)));
    assert_eq!(map.last_key_value(), Some((&999, &-999)));
}

// ─── Entry API ───────────────────────────────────────────────────────────────

#[test]
fn entry_or_insert_counts() {
    let mut count: OrderedMap<&str, usize> = OrderedMap::new();
    for word in ["tree", "map", "tree", "node", "tree"] {
        *count.entry(word).or_insert(0) += 1;
    }

    assert_eq!(count["tree"], 3);
    assert_eq!(count["map"], 1);
    assert_eq!(count["node"], 1);
    assert_eq!(count.len(), 3);
}

#[test]
fn entry_occupied_remove() {
    let mut map: OrderedMap<i64, i64> = (0..16).map(|i| (i, i * 2)).collect();

    match map.entry(7) {
        Entry::Occupied(entry) => {
            assert_eq!(entry.key(), &7);
            assert_eq!(entry.remove_entry(), (7, 14));
        }
        Entry::Vacant(_) => panic!("key 7 must be present"),
    }

    assert_eq!(map.len(), 15);
    assert!(!map.contains_key(&7));
    let keys = visited_keys(&map);
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn entry_and_modify_then_or_insert() {
    let mut map: OrderedMap<&str, i32> = OrderedMap::new();

    map.entry("stat").and_modify(|v| *v += 1).or_insert(10);
    assert_eq!(map["stat"], 10);

    map.entry("stat").and_modify(|v| *v += 1).or_insert(10);
    assert_eq!(map["stat"], 11);
}
