//! End-to-end scenarios for the double trie.

use twintrie::{DoubleTrie, TrieError, TrieMap, TrieSearch};

#[test]
fn test_keyword_set_with_near_miss() {
    let mut trie = DoubleTrie::new();
    trie.insert(b"he", 1).unwrap();
    trie.insert(b"she", 2).unwrap();
    trie.insert(b"his", 3).unwrap();
    trie.insert(b"hers", 4).unwrap();

    assert_eq!(trie.search(b"he"), Some(1));
    assert_eq!(trie.search(b"she"), Some(2));
    assert_eq!(trie.search(b"his"), Some(3));
    assert_eq!(trie.search(b"hers"), Some(4));
    assert_eq!(trie.search(b"her"), None);
    assert_eq!(trie.search(b"h"), None);
    assert_eq!(trie.search(b"hershey"), None);
}

#[test]
fn test_rewrite_value() {
    let mut trie = DoubleTrie::new();
    trie.insert(b"bachelor", 1).unwrap();
    trie.insert(b"jar", 2).unwrap();
    trie.insert(b"badge", 3).unwrap();
    trie.insert(b"baby", 4).unwrap();
    trie.insert(b"jar", 9).unwrap();

    assert_eq!(trie.search(b"bachelor"), Some(1));
    assert_eq!(trie.search(b"jar"), Some(9));
    assert_eq!(trie.search(b"badge"), Some(3));
    assert_eq!(trie.search(b"baby"), Some(4));
}

#[test]
fn test_nested_prefixes() {
    let mut trie = DoubleTrie::new();
    trie.insert(b"a", 1).unwrap();
    trie.insert(b"ab", 2).unwrap();
    trie.insert(b"abc", 3).unwrap();

    assert_eq!(trie.search(b"a"), Some(1));
    assert_eq!(trie.search(b"ab"), Some(2));
    assert_eq!(trie.search(b"abc"), Some(3));
    assert_eq!(trie.search(b"abcd"), None);
}

#[test]
fn test_zero_value_rejected_and_absent() {
    let mut trie = DoubleTrie::new();
    assert!(matches!(
        trie.insert(b"x", 0),
        Err(TrieError::InvalidValue { value: 0 })
    ));
    assert_eq!(trie.search(b"x"), None);
}

#[test]
fn test_empty_key_rejected() {
    let mut trie = DoubleTrie::new();
    assert!(matches!(
        trie.insert(b"", 1),
        Err(TrieError::InvalidArgument { .. })
    ));
    assert_eq!(trie.search(b""), None);
}

#[cfg(feature = "mmap")]
#[test]
fn test_shared_suffix_persist_reload_repeat() {
    use twintrie::MappedDoubleTrie;

    let keys: &[(&[u8], i32)] = &[(b"car", 1), (b"card", 2), (b"care", 3), (b"cat", 4)];

    let mut trie = DoubleTrie::new();
    for &(key, value) in keys {
        trie.insert(key, value).unwrap();
    }
    for &(key, value) in keys {
        assert_eq!(trie.search(key), Some(value));
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.trie");
    trie.build(&path, false).unwrap();

    let mapped = MappedDoubleTrie::open(&path).unwrap();
    for &(key, value) in keys {
        assert_eq!(mapped.search(key), Some(value), "reloaded key {:?}", key);
    }
    assert_eq!(mapped.search(b"ca"), None);
    assert_eq!(mapped.search(b"cart"), None);
    assert_eq!(mapped.search(b"dog"), None);
}

#[test]
fn test_long_keys_and_deep_splits() {
    let mut trie = DoubleTrie::new();
    let base = b"internationalization".to_vec();
    let mut keys = Vec::new();
    for i in 1..base.len() {
        keys.push(base[..i].to_vec());
    }
    // longest first so every shorter key forces a rear split
    for (i, key) in keys.iter().enumerate().rev() {
        trie.insert(key, i as i32 + 1).unwrap();
    }
    for (i, key) in keys.iter().enumerate() {
        assert_eq!(trie.search(key), Some(i as i32 + 1), "key {:?}", key);
    }
    assert_eq!(trie.search(&base), None);
}
