//! The suffix trie: a front trie plus a flat tail array.
//!
//! Any state with a single continuation collapses the rest of its key into
//! raw symbols in the tail array: a negative `base` points at the packed
//! `symbols… terminator value` run. Inserting a key that shares a prefix
//! with a stored tail grows the shared run back into the trie and leaves two
//! twigs, one per tail.

use crate::config::TrieConfig;
use crate::error::{Result, TrieError};
use crate::fsa::basic_trie::{BasicTrie, Extremum, ROOT};
use crate::fsa::traits::{StateTable, TrieMap, TrieSearch};
use crate::fsa::{char_in, Symbol, TERMINATOR};
use crate::io::{pretty_size, SectionWriter};
use crate::{StateId, Value};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[cfg(feature = "mmap")]
use crate::fsa::basic_trie::RawStates;
#[cfg(feature = "mmap")]
use crate::io::{i32_at, MappedFile, SectionReader};

const MAGIC: [u8; 16] = *b"TAIL_TRIE\0\0\0\0\0\0\0";

/// Read access to tail cells; out-of-range reads yield a value that can
/// never match a symbol, the terminator, or a stored value.
pub(crate) trait TailStore {
    fn cell(&self, k: usize) -> i32;
}

impl TailStore for [i32] {
    fn cell(&self, k: usize) -> i32 {
        self.get(k).copied().unwrap_or(-1)
    }
}

/// A mutable suffix trie.
///
/// # Examples
///
/// ```rust
/// use twintrie::{SuffixTrie, TrieMap, TrieSearch};
///
/// let mut trie = SuffixTrie::new();
/// trie.insert(b"alpha", 1).unwrap();
/// trie.insert(b"alphabet", 2).unwrap();
/// assert_eq!(trie.search(b"alpha"), Some(1));
/// assert_eq!(trie.search(b"alphabet"), Some(2));
/// assert_eq!(trie.search(b"alph"), None);
/// ```
pub struct SuffixTrie {
    trie: BasicTrie,
    tail: Vec<i32>,
    next_suffix: u32,
}

impl SuffixTrie {
    /// Create an empty suffix trie.
    pub fn new() -> Self {
        Self::from_config(TrieConfig::default())
    }

    /// Create an empty suffix trie with explicit sizing.
    pub fn with_config(config: TrieConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: TrieConfig) -> Self {
        Self {
            trie: BasicTrie::with_capacity(config.initial_states),
            // slot 0 stays unused so a tail offset is never ambiguous with
            // an unused base
            tail: vec![0; config.initial_tail.clamp(2, i32::MAX as usize)],
            next_suffix: 1,
        }
    }

    fn tail_cell(&self, k: usize) -> i32 {
        self.tail.cell(k)
    }

    /// Append `rest` (plus terminator and value) as a fresh tail and point
    /// `s` at it.
    fn insert_suffix(&mut self, s: StateId, rest: &[u8], value: Value) -> Result<()> {
        let start = self.next_suffix as usize;
        let needed = start + rest.len() + 2;
        if needed > i32::MAX as usize {
            return Err(TrieError::capacity_exceeded(needed as u64));
        }
        if needed > self.tail.len() {
            let mut target = self.tail.len().max(2);
            while target < needed {
                target = target.saturating_mul(2).min(i32::MAX as usize);
            }
            self.tail.resize(target, 0);
        }
        self.trie.set_base(s, -(start as i32));
        for &b in rest {
            self.tail[self.next_suffix as usize] = char_in(b) as i32;
            self.next_suffix += 1;
        }
        self.tail[self.next_suffix as usize] = TERMINATOR as i32;
        self.next_suffix += 1;
        self.tail[self.next_suffix as usize] = value;
        self.next_suffix += 1;
        Ok(())
    }

    /// Split the tail of `s`: grow the run shared with `rest` back into the
    /// trie and leave a twig for each side of the divergence.
    fn branch(&mut self, s: StateId, rest: &[u8], value: Value) -> Result<()> {
        let start = (-self.trie.base(s)) as usize;

        let mut common: Vec<Symbol> = Vec::new();
        let mut ext = Extremum::default();
        let mut p = 0;
        while p < rest.len() && self.tail_cell(start + p) == char_in(rest[p]) as i32 {
            let sym = char_in(rest[p]);
            common.push(sym);
            ext.observe(sym);
            p += 1;
        }
        if p == rest.len() && self.tail_cell(start + p) == TERMINATOR as i32 {
            // same key: overwrite in place
            self.tail[start + p + 1] = value;
            return Ok(());
        }

        let nbase = self.trie.find_base(&common, ext)?;
        self.trie.set_base(s, nbase as i32);
        let mut fork = s;
        for &sym in &common {
            fork = self.trie.create_transition(fork, sym)?;
        }

        // twig for the stored tail, pointing past the consumed run
        let old_sym = self.tail_cell(start + p) as Symbol;
        let old = self.trie.create_transition(fork, old_sym)?;
        self.trie.set_base(old, -((start + p + 1) as i32));

        // creating the first twig may have migrated the fork; its child's
        // check always names the current id
        let fork = self.trie.prev(old);
        if p < rest.len() {
            let new = self.trie.create_transition(fork, char_in(rest[p]))?;
            self.insert_suffix(new, &rest[p + 1..], value)
        } else {
            let new = self.trie.create_transition(fork, TERMINATOR)?;
            self.insert_suffix(new, &[], value)
        }
    }
}

impl Default for SuffixTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SuffixTrie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuffixTrie")
            .field("states", &self.trie.state_count())
            .field("tail_cells", &self.next_suffix)
            .finish()
    }
}

impl TrieSearch for SuffixTrie {
    fn search(&self, key: &[u8]) -> Option<Value> {
        suffix_search(&self.trie, self.tail.as_slice(), key)
    }
}

impl TrieMap for SuffixTrie {
    fn insert(&mut self, key: &[u8], value: Value) -> Result<()> {
        if value <= 0 {
            return Err(TrieError::invalid_value(value));
        }
        if key.is_empty() {
            return Err(TrieError::invalid_argument("empty key"));
        }

        let (s, p) = self.trie.go_forward(ROOT, key);
        if self.trie.base(s) < 0 {
            return self.branch(s, &key[p..], value);
        }
        if p < key.len() {
            let t = self.trie.create_transition(s, char_in(key[p]))?;
            return self.insert_suffix(t, &key[p + 1..], value);
        }
        // key exhausted on an inner state: the empty remainder lives under
        // a terminator child
        match self.trie.transition(s, TERMINATOR) {
            Some(t) => {
                let b = self.trie.base(t);
                if b < 0 {
                    let k = (-b) as usize;
                    if self.tail_cell(k) == TERMINATOR as i32 {
                        self.tail[k + 1] = value;
                    } else {
                        self.tail[k] = value;
                    }
                    Ok(())
                } else {
                    self.insert_suffix(t, &[], value)
                }
            }
            None => {
                let t = self.trie.create_transition(s, TERMINATOR)?;
                self.insert_suffix(t, &[], value)
            }
        }
    }

    fn build<P: AsRef<Path>>(&self, path: P, verbose: bool) -> Result<()> {
        let file = File::create(path)?;
        let mut w = SectionWriter::new(BufWriter::new(file));
        w.write_bytes(&MAGIC)?;
        w.write_u32(self.next_suffix)?;
        for &cell in &self.tail[..self.next_suffix as usize] {
            w.write_i32(cell)?;
        }
        self.trie.write_section(&mut w)?;
        w.flush()?;
        if verbose {
            let suffix = self.next_suffix as usize * 4;
            let trie = self.trie.section_bytes();
            log::info!(
                "suffix = {}, trie = {}, total = {}",
                pretty_size(suffix),
                pretty_size(trie),
                pretty_size(suffix + trie),
            );
        }
        Ok(())
    }
}

/// Search shared by the owned trie and the mapped view.
pub(crate) fn suffix_search<T, S>(trie: &T, tail: &S, key: &[u8]) -> Option<Value>
where
    T: StateTable + ?Sized,
    S: TailStore + ?Sized,
{
    let (mut s, p) = trie.go_forward(ROOT, key);
    let mut via_terminator = false;
    if trie.base(s) >= 0 {
        if p < key.len() {
            return None;
        }
        s = trie.transition(s, TERMINATOR)?;
        via_terminator = true;
    }
    let b = trie.base(s);
    if b >= 0 {
        return None;
    }
    let start = (-b) as usize;
    let rem = &key[p..];
    for (i, &byte) in rem.iter().enumerate() {
        if tail.cell(start + i) != char_in(byte) as i32 {
            return None;
        }
    }
    let after = start + rem.len();
    let v = if tail.cell(after) == TERMINATOR as i32 {
        tail.cell(after + 1)
    } else if via_terminator {
        // reached through the terminator hop: base points straight at the
        // value cell
        tail.cell(start)
    } else {
        return None;
    };
    (v > 0).then_some(v)
}

/// Byte offsets of the sections inside a mapped suffix trie file.
#[cfg(feature = "mmap")]
#[derive(Debug, Clone, Copy)]
struct SuffixLayout {
    tail_off: usize,
    tail_count: u32,
    trie_off: usize,
    trie_count: u32,
}

#[cfg(feature = "mmap")]
impl SuffixLayout {
    fn parse(data: &[u8]) -> Result<Self> {
        let mut r = SectionReader::new(data);
        let magic = r.read_bytes(16)?;
        if magic != MAGIC {
            return Err(TrieError::corrupt_file("not a suffix trie file"));
        }
        let tail_count = r.read_u32()?;
        let tail_off = r.position();
        let tail_bytes = (tail_count as usize)
            .checked_mul(4)
            .ok_or_else(|| TrieError::corrupt_file("tail array overflow"))?;
        r.read_bytes(tail_bytes)?;
        let trie_hdr = r.position();
        let trie = RawStates::parse(&mut r)?;
        Ok(Self {
            tail_off,
            tail_count,
            trie_off: trie_hdr + 8,
            trie_count: trie.state_count(),
        })
    }
}

/// Tail cells read straight out of the mapping.
#[cfg(feature = "mmap")]
struct RawTail<'a> {
    data: &'a [u8],
    count: u32,
}

#[cfg(feature = "mmap")]
impl TailStore for RawTail<'_> {
    fn cell(&self, k: usize) -> i32 {
        if (k as u64) < self.count as u64 {
            i32_at(self.data, k * 4)
        } else {
            -1
        }
    }
}

/// A suffix trie loaded read-only from a built file.
#[cfg(feature = "mmap")]
#[derive(Debug)]
pub struct MappedSuffixTrie {
    map: MappedFile,
    layout: SuffixLayout,
}

#[cfg(feature = "mmap")]
impl MappedSuffixTrie {
    /// Map the file built by [`SuffixTrie::build`] at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let map = MappedFile::open(path)?;
        let layout = SuffixLayout::parse(map.as_slice())?;
        log::debug!(
            "loaded suffix trie: {} states, {} tail cells",
            layout.trie_count,
            layout.tail_count
        );
        Ok(Self { map, layout })
    }

    fn states(&self) -> RawStates<'_> {
        let off = self.layout.trie_off;
        let len = self.layout.trie_count as usize * 8;
        RawStates::new(&self.map.as_slice()[off..off + len], self.layout.trie_count)
    }

    fn tail(&self) -> RawTail<'_> {
        let off = self.layout.tail_off;
        let len = self.layout.tail_count as usize * 4;
        RawTail {
            data: &self.map.as_slice()[off..off + len],
            count: self.layout.tail_count,
        }
    }
}

#[cfg(feature = "mmap")]
impl TrieSearch for MappedSuffixTrie {
    fn search(&self, key: &[u8]) -> Option<Value> {
        suffix_search(&self.states(), &self.tail(), key)
    }
}
