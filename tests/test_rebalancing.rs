//! The canonical order-4 rebalancing walk-through

use pagetree::tree_utils::{collect_entries, validate_tree};
use pagetree::TreeBuilder;
use tempfile::TempDir;

const KEYS: [i32; 8] = [10, 20, 5, 6, 12, 30, 7, 17];

#[test]
fn order_four_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let mut tree = TreeBuilder::new().order(4).create(dir.path().join("scenario.db"))?;

    // Three inserts fill the root leaf to its capacity of order - 1 keys.
    for &key in &KEYS[..3] {
        tree.insert(key, key)?;
    }
    assert_eq!(tree.height()?, 1);
    assert_eq!(validate_tree(&mut tree)?.nodes, 1);

    // The fourth insert splits the full root: the new root holds exactly
    // the promoted median, with two leaves under it.
    tree.insert(KEYS[3], KEYS[3])?;
    assert_eq!(tree.height()?, 2);
    let stats = validate_tree(&mut tree)?;
    assert_eq!(stats.nodes, 3);

    let mut out = Vec::new();
    tree.print(&mut out)?;
    assert_eq!(String::from_utf8(out)?.lines().next(), Some("root: [10=10]"));

    for &key in &KEYS[4..] {
        tree.insert(key, key)?;
        validate_tree(&mut tree)?;
    }

    // All eight keys present, tree still two levels deep.
    assert_eq!(tree.height()?, 2);
    let (page, idx) = tree.search(17)?.expect("17 was inserted");
    assert!(page.0 > 0);
    assert!(idx < 3);
    for &key in &KEYS {
        assert_eq!(tree.get(key)?, Some(key));
    }

    // Removing 6 only touches its leaf here; every other key survives.
    tree.remove(6)?;
    assert_eq!(tree.search(6)?, None);
    for &key in KEYS.iter().filter(|&&k| k != 6) {
        assert_eq!(tree.get(key)?, Some(key), "key {key} lost by remove(6)");
    }
    validate_tree(&mut tree)?;

    let keys_left: Vec<i32> = collect_entries(&mut tree)?.iter().map(|&(k, _)| k).collect();
    assert_eq!(keys_left, vec![5, 7, 10, 12, 17, 20, 30]);

    Ok(())
}
