//! Node splitting behavior on the insert path

use pagetree::tree_utils::{collect_entries, validate_tree};
use pagetree::TreeBuilder;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tempfile::TempDir;

#[test]
fn exactly_order_keys_force_one_root_split() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let mut tree = TreeBuilder::new().order(4).create(dir.path().join("split.db"))?;

    // order - 1 keys fill the root leaf without splitting
    for key in [1, 2, 3] {
        tree.insert(key, key)?;
    }
    assert_eq!(tree.height()?, 1);
    assert_eq!(validate_tree(&mut tree)?.nodes, 1);

    // the order'th key splits the root: one new root, one sibling
    tree.insert(4, 4)?;
    let stats = validate_tree(&mut tree)?;
    assert_eq!(tree.height()?, 2);
    assert_eq!(stats.nodes, 3);

    let mut out = Vec::new();
    tree.print(&mut out)?;
    let text = String::from_utf8(out)?;
    // a freshly split root holds exactly one key with two children under it
    assert_eq!(text.lines().next(), Some("root: [2=2]"));

    Ok(())
}

#[test]
fn ascending_inserts_keep_invariants() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let mut tree = TreeBuilder::new().order(4).create(dir.path().join("asc.db"))?;

    for key in 0..200 {
        tree.insert(key, key * 3)?;
        validate_tree(&mut tree)?;
    }

    let entries = collect_entries(&mut tree)?;
    assert_eq!(entries.len(), 200);
    assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
    for key in 0..200 {
        assert_eq!(tree.get(key)?, Some(key * 3));
    }

    Ok(())
}

#[test]
fn descending_inserts_keep_invariants() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let mut tree = TreeBuilder::new().order(6).create(dir.path().join("desc.db"))?;

    for key in (0..200).rev() {
        tree.insert(key, key)?;
    }
    let stats = validate_tree(&mut tree)?;
    assert_eq!(stats.entries, 200);

    for key in 0..200 {
        assert_eq!(tree.get(key)?, Some(key));
    }

    Ok(())
}

#[test]
fn shuffled_inserts_keep_invariants() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let mut tree = TreeBuilder::new().order(4).create(dir.path().join("shuffled.db"))?;

    let mut keys: Vec<i32> = (0..500).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(42));

    for &key in &keys {
        tree.insert(key, -key)?;
    }

    let stats = validate_tree(&mut tree)?;
    assert_eq!(stats.entries, 500);
    let entries = collect_entries(&mut tree)?;
    assert_eq!(entries, (0..500).map(|k| (k, -k)).collect::<Vec<_>>());

    Ok(())
}

#[test]
fn wide_orders_split_later() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let mut tree = TreeBuilder::new().order(32).create(dir.path().join("wide.db"))?;

    // 31 keys fit the root leaf of an order-32 tree
    for key in 0..31 {
        tree.insert(key, key)?;
    }
    assert_eq!(tree.height()?, 1);

    tree.insert(31, 31)?;
    assert_eq!(tree.height()?, 2);
    validate_tree(&mut tree)?;

    Ok(())
}
