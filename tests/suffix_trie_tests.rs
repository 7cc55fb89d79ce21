//! End-to-end scenarios for the suffix trie.

use twintrie::{SuffixTrie, TrieError, TrieMap, TrieSearch};

#[test]
fn test_tail_branch_on_extension() {
    let mut trie = SuffixTrie::new();
    trie.insert(b"alpha", 1).unwrap();
    trie.insert(b"alphabet", 2).unwrap();

    assert_eq!(trie.search(b"alpha"), Some(1));
    assert_eq!(trie.search(b"alphabet"), Some(2));
    assert_eq!(trie.search(b"alph"), None);
    assert_eq!(trie.search(b"alphabe"), None);
}

#[test]
fn test_keyword_set_with_near_miss() {
    let mut trie = SuffixTrie::new();
    trie.insert(b"he", 1).unwrap();
    trie.insert(b"she", 2).unwrap();
    trie.insert(b"his", 3).unwrap();
    trie.insert(b"hers", 4).unwrap();

    assert_eq!(trie.search(b"he"), Some(1));
    assert_eq!(trie.search(b"she"), Some(2));
    assert_eq!(trie.search(b"his"), Some(3));
    assert_eq!(trie.search(b"hers"), Some(4));
    assert_eq!(trie.search(b"her"), None);
}

#[test]
fn test_rewrite_value() {
    let mut trie = SuffixTrie::new();
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
    let mut trie = SuffixTrie::new();
    trie.insert(b"a", 1).unwrap();
    trie.insert(b"ab", 2).unwrap();
    trie.insert(b"abc", 3).unwrap();

    assert_eq!(trie.search(b"a"), Some(1));
    assert_eq!(trie.search(b"ab"), Some(2));
    assert_eq!(trie.search(b"abc"), Some(3));
    assert_eq!(trie.search(b"abcd"), None);
}

#[test]
fn test_invalid_arguments() {
    let mut trie = SuffixTrie::new();
    assert!(matches!(
        trie.insert(b"x", 0),
        Err(TrieError::InvalidValue { value: 0 })
    ));
    assert!(matches!(
        trie.insert(b"", 5),
        Err(TrieError::InvalidArgument { .. })
    ));
    assert_eq!(trie.search(b"x"), None);
}

#[cfg(feature = "mmap")]
#[test]
fn test_persist_reload() {
    use twintrie::MappedSuffixTrie;

    let keys: &[(&[u8], i32)] = &[
        (b"alpha", 1),
        (b"alphabet", 2),
        (b"beta", 3),
        (b"betamax", 4),
        (b"b", 5),
    ];

    let mut trie = SuffixTrie::new();
    for &(key, value) in keys {
        trie.insert(key, value).unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tails.trie");
    trie.build(&path, true).unwrap();

    let mapped = MappedSuffixTrie::open(&path).unwrap();
    for &(key, value) in keys {
        assert_eq!(mapped.search(key), Some(value), "reloaded key {:?}", key);
    }
    assert_eq!(mapped.search(b"alph"), None);
    assert_eq!(mapped.search(b"betama"), None);
    assert_eq!(mapped.search(b"gamma"), None);
}

#[test]
fn test_many_branches_from_common_stem() {
    let mut trie = SuffixTrie::new();
    let mut expected = Vec::new();
    for i in 0..50u8 {
        let key = vec![b'p', b'r', b'e', b'f', b'i', b'x', i, i.wrapping_mul(7)];
        trie.insert(&key, i as i32 + 1).unwrap();
        expected.push((key, i as i32 + 1));
    }
    for (key, value) in &expected {
        assert_eq!(trie.search(key), Some(*value), "key {:?}", key);
    }
}
