//! The double-array state machine underlying every trie variant.
//!
//! Two parallel `i32` arrays hold the automaton: a child of state `s` on
//! symbol `c` lives at index `base(s) + c` iff `check(base(s) + c) == s`.
//! Insertion packs sibling sets densely; when a wanted cell is occupied,
//! whichever of the two competing sibling sets is smaller migrates to a
//! fresh base found by [`BasicTrie::find_base`].

use crate::error::{Result, TrieError};
use crate::fsa::traits::{Relocator, StateTable, TrieSearch};
use crate::fsa::{char_in, Symbol, ALPHABET_SIZE, TERMINATOR};
use crate::io::SectionWriter;
use crate::{StateId, Value};
use std::io::Write;

#[cfg(feature = "mmap")]
use crate::io::{i32_at, SectionReader};

/// The root state id. State 0 is reserved and never used.
pub const ROOT: StateId = 1;

/// State ids and bases must stay representable as positive `i32`.
const MAX_STATES: usize = i32::MAX as usize;

/// One base/check cell. All-zero means free.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct StateCell {
    pub base: i32,
    pub check: i32,
}

/// Min/max of a symbol set; bounds the free-base hunt before the full scan.
///
/// Zero doubles as "unset", so a terminator-only set reports `{0, 0}` and the
/// candidate window still covers cell `b + 0`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Extremum {
    pub min: Symbol,
    pub max: Symbol,
}

impl Extremum {
    /// Widen the bounds to cover `sym`.
    pub fn observe(&mut self, sym: Symbol) {
        if sym > self.max || self.max == 0 {
            self.max = sym;
        }
        if sym < self.min || self.min == 0 {
            self.min = sym;
        }
    }
}

/// A mutable double-array trie over the 257-symbol alphabet.
///
/// Standalone it maps keys to values stored in the `base` of terminator
/// children; embedded in [`DoubleTrie`]/[`SuffixTrie`] the containing trie
/// interprets negative bases as payload references and observes state moves
/// through a [`Relocator`] hook.
///
/// [`DoubleTrie`]: crate::fsa::DoubleTrie
/// [`SuffixTrie`]: crate::fsa::SuffixTrie
///
/// # Examples
///
/// ```rust
/// use twintrie::{BasicTrie, TrieSearch};
///
/// let mut trie = BasicTrie::new();
/// trie.insert(b"hello", 7).unwrap();
/// assert_eq!(trie.search(b"hello"), Some(7));
/// assert_eq!(trie.search(b"hell"), None);
/// ```
pub struct BasicTrie {
    states: Vec<StateCell>,
    last_base: u32,
    relocator: Option<Box<dyn Relocator>>,
}

impl BasicTrie {
    /// Create an empty trie with the default initial capacity.
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    /// Create an empty trie sized for roughly `capacity` states.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(ALPHABET_SIZE + 2).min(MAX_STATES);
        let mut states = vec![StateCell::default(); capacity];
        // Root is its own parent; the sentinel keeps cell 1 out of every
        // free-base hunt.
        states[ROOT as usize].check = ROOT as i32;
        Self {
            states,
            last_base: 0,
            relocator: None,
        }
    }

    /// Install a hook observing state migrations.
    pub fn set_relocator(&mut self, relocator: Box<dyn Relocator>) {
        self.relocator = Some(relocator);
    }

    /// Insert `key` with a positive `value`, replacing any previous value.
    pub fn insert(&mut self, key: &[u8], value: Value) -> Result<()> {
        if value <= 0 {
            return Err(TrieError::invalid_value(value));
        }
        if key.is_empty() {
            return Err(TrieError::invalid_argument("empty key"));
        }
        let (mut s, p) = self.go_forward(ROOT, key);
        for &b in &key[p..] {
            s = self.create_transition(s, char_in(b))?;
        }
        let t = match self.transition(s, TERMINATOR) {
            Some(t) => t,
            None => self.create_transition(s, TERMINATOR)?,
        };
        self.set_base(t, value);
        Ok(())
    }

    pub(crate) fn set_base(&mut self, s: StateId, value: i32) {
        if let Some(cell) = self.states.get_mut(s as usize) {
            cell.base = value;
        }
    }

    pub(crate) fn set_check(&mut self, s: StateId, value: i32) {
        if let Some(cell) = self.states.get_mut(s as usize) {
            cell.check = value;
        }
    }

    /// Grow the state arrays to cover at least `required` cells.
    fn resize_states(&mut self, required: usize) -> Result<()> {
        if required <= self.states.len() {
            return Ok(());
        }
        let mut target = self.states.len().max(ALPHABET_SIZE);
        while target < required {
            target = target.saturating_mul(2);
        }
        let target = target.min(MAX_STATES);
        if target < required {
            return Err(TrieError::capacity_exceeded(required as u64));
        }
        self.states.resize(target, StateCell::default());
        Ok(())
    }

    /// Enumerate the symbols on which `s` has children, with their extremum.
    pub(crate) fn find_exist_target(&self, s: StateId) -> (Vec<Symbol>, Extremum) {
        let mut targets = Vec::new();
        let mut ext = Extremum::default();
        let b = self.base(s);
        if b > 0 {
            for c in 0..ALPHABET_SIZE as Symbol {
                let t = b as u32 + c as u32;
                if t < self.state_count() && self.check(t) == s as i32 {
                    targets.push(c);
                    ext.observe(c);
                }
            }
        }
        (targets, ext)
    }

    /// Find the smallest base past the `last_base` cursor under which every
    /// cell `b + c` for `c` in `symbols` is free, growing the arrays as
    /// needed. Advances the cursor.
    pub(crate) fn find_base(&mut self, symbols: &[Symbol], ext: Extremum) -> Result<u32> {
        let mut b = self.last_base;
        loop {
            b += 1;
            let needed = b as usize + ext.max as usize + 1;
            if needed > self.states.len() {
                self.resize_states(needed)?;
            }
            if self.check(b + ext.min as u32) <= 0
                && self.check(b + ext.max as u32) <= 0
                && symbols.iter().all(|&c| self.check(b + c as u32) <= 0)
            {
                break;
            }
        }
        self.last_base = b;
        Ok(b)
    }

    /// Move the children of `owner` to a fresh base. `stand` is a state id
    /// the caller needs to keep pointing at the same logical state; the
    /// possibly-moved id is returned.
    fn relocate(
        &mut self,
        mut stand: StateId,
        owner: StateId,
        targets: &[Symbol],
        ext: Extremum,
    ) -> Result<StateId> {
        let obase = self.base(owner);
        let nbase = self.find_base(targets, ext)? as i32;
        if obase > 0 {
            for &c in targets {
                let old = obase as u32 + c as u32;
                if !self.check_transition(owner, old) {
                    continue;
                }
                let new = nbase as u32 + c as u32;
                self.states[new as usize] = self.states[old as usize];
                // regroup grandchildren under the moved cell
                let (grand, _) = self.find_exist_target(old);
                let cbase = self.base(old);
                for &g in &grand {
                    self.set_check(cbase as u32 + g as u32, new as i32);
                }
                if stand == old {
                    stand = new;
                }
                self.fire_relocator(old, new);
                self.states[old as usize] = StateCell::default();
            }
        }
        self.set_base(owner, nbase);
        Ok(stand)
    }

    fn fire_relocator(&mut self, old: StateId, new: StateId) {
        if let Some(mut hook) = self.relocator.take() {
            hook.on_relocate(self, old, new);
            self.relocator = Some(hook);
        }
    }

    /// Ensure a child of `s` on `sym` exists and return its id.
    ///
    /// On collision, whichever of the two implicated sibling sets is smaller
    /// migrates: the rival parent's children if `s` would end up with more,
    /// otherwise `s`'s own (including the incoming symbol).
    pub(crate) fn create_transition(&mut self, s: StateId, sym: Symbol) -> Result<StateId> {
        let mut s = s;
        let mut t = self.base(s).max(0) as u32 + sym as u32;
        self.resize_states(t as usize + 1)?;
        if !(self.base(s) > 0 && self.check(t) <= 0) {
            let (mut targets, mut ext) = self.find_exist_target(s);
            let rival = self.check(t);
            let (rival_targets, rival_ext) = if rival > 0 {
                self.find_exist_target(rival as StateId)
            } else {
                (Vec::new(), Extremum::default())
            };
            if !rival_targets.is_empty() && targets.len() + 1 > rival_targets.len() {
                s = self.relocate(s, rival as StateId, &rival_targets, rival_ext)?;
            } else {
                targets.push(sym);
                ext.observe(sym);
                s = self.relocate(s, s, &targets, ext)?;
            }
            t = self.base(s) as u32 + sym as u32;
            self.resize_states(t as usize + 1)?;
        }
        self.set_check(t, s as i32);
        Ok(t)
    }

    /// Number of children of `s`.
    pub(crate) fn outdegree(&self, s: StateId) -> usize {
        let b = self.base(s);
        if b <= 0 {
            return 0;
        }
        (0..ALPHABET_SIZE as Symbol)
            .filter(|&c| {
                let t = b as u32 + c as u32;
                t < self.state_count() && self.check(t) == s as i32
            })
            .count()
    }

    /// Serialized size of this trie's file section in bytes.
    pub(crate) fn section_bytes(&self) -> usize {
        8 + self.states.len() * 8
    }

    /// Write the header and state cells as one file section.
    pub(crate) fn write_section<W: Write>(&self, w: &mut SectionWriter<W>) -> Result<()> {
        w.write_u32(self.states.len() as u32)?;
        w.write_u32(self.last_base)?;
        for cell in &self.states {
            w.write_i32(cell.base)?;
            w.write_i32(cell.check)?;
        }
        Ok(())
    }
}

impl Default for BasicTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BasicTrie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicTrie")
            .field("states", &self.states.len())
            .field("last_base", &self.last_base)
            .field("relocator", &self.relocator.is_some())
            .finish()
    }
}

impl StateTable for BasicTrie {
    fn state_count(&self) -> u32 {
        self.states.len() as u32
    }

    fn base(&self, s: StateId) -> i32 {
        self.states.get(s as usize).map(|c| c.base).unwrap_or(0)
    }

    fn check(&self, s: StateId) -> i32 {
        self.states.get(s as usize).map(|c| c.check).unwrap_or(0)
    }
}

impl TrieSearch for BasicTrie {
    fn search(&self, key: &[u8]) -> Option<Value> {
        let (s, p) = self.go_forward(ROOT, key);
        if p < key.len() {
            return None;
        }
        let t = self.transition(s, TERMINATOR)?;
        let v = self.base(t);
        (v > 0).then_some(v)
    }
}

/// A read-only state table over one section of a mapped file.
#[cfg(feature = "mmap")]
pub(crate) struct RawStates<'a> {
    cells: &'a [u8],
    count: u32,
}

#[cfg(feature = "mmap")]
impl<'a> RawStates<'a> {
    /// View `count` cells stored in `cells`.
    pub(crate) fn new(cells: &'a [u8], count: u32) -> Self {
        Self { cells, count }
    }

    /// Parse a basic-trie section (header plus cells) out of `r`.
    pub(crate) fn parse(r: &mut SectionReader<'a>) -> Result<Self> {
        let count = r.read_u32()?;
        let _last_base = r.read_u32()?;
        let bytes = (count as usize)
            .checked_mul(8)
            .ok_or_else(|| TrieError::corrupt_file("state count overflow"))?;
        let cells = r.read_bytes(bytes)?;
        Ok(Self { cells, count })
    }
}

#[cfg(feature = "mmap")]
impl StateTable for RawStates<'_> {
    fn state_count(&self) -> u32 {
        self.count
    }

    fn base(&self, s: StateId) -> i32 {
        if s < self.count {
            i32_at(self.cells, s as usize * 8)
        } else {
            0
        }
    }

    fn check(&self, s: StateId) -> i32 {
        if s < self.count {
            i32_at(self.cells, s as usize * 8 + 4)
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn assert_automaton_consistent(trie: &BasicTrie) {
        // every used state is a well-formed child of its parent
        for t in 2..trie.state_count() {
            let p = trie.check(t);
            if p <= 0 {
                continue;
            }
            let b = trie.base(p as StateId);
            assert!(b > 0, "parent {} of {} has no base", p, t);
            let c = t as i64 - b as i64;
            assert!(
                (0..ALPHABET_SIZE as i64).contains(&c),
                "state {} unreachable from parent {}",
                t,
                p
            );
        }
    }

    #[test]
    fn test_insert_and_search() {
        let mut trie = BasicTrie::new();
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
        assert_automaton_consistent(&trie);
    }

    #[test]
    fn test_overwrite() {
        let mut trie = BasicTrie::new();
        trie.insert(b"jar", 2).unwrap();
        trie.insert(b"jar", 9).unwrap();
        assert_eq!(trie.search(b"jar"), Some(9));
    }

    #[test]
    fn test_prefix_keys() {
        let mut trie = BasicTrie::new();
        trie.insert(b"a", 1).unwrap();
        trie.insert(b"ab", 2).unwrap();
        trie.insert(b"abc", 3).unwrap();
        assert_eq!(trie.search(b"a"), Some(1));
        assert_eq!(trie.search(b"ab"), Some(2));
        assert_eq!(trie.search(b"abc"), Some(3));
        assert_eq!(trie.search(b"abcd"), None);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let mut trie = BasicTrie::new();
        assert!(matches!(
            trie.insert(b"x", 0),
            Err(TrieError::InvalidValue { value: 0 })
        ));
        assert!(matches!(
            trie.insert(b"", 1),
            Err(TrieError::InvalidArgument { .. })
        ));
        assert_eq!(trie.search(b"x"), None);
    }

    #[test]
    fn test_high_bytes_round_trip() {
        let mut trie = BasicTrie::new();
        trie.insert(&[0xFF, 0x00, 0xFF], 5).unwrap();
        trie.insert(&[0xFF], 6).unwrap();
        assert_eq!(trie.search(&[0xFF, 0x00, 0xFF]), Some(5));
        assert_eq!(trie.search(&[0xFF]), Some(6));
        assert_eq!(trie.search(&[0x00]), None);
    }

    #[test]
    fn test_growth_past_initial_capacity() {
        let mut trie = BasicTrie::with_capacity(16);
        let key = vec![b'k'; 2000];
        trie.insert(&key, 1).unwrap();
        assert_eq!(trie.search(&key), Some(1));
        assert!(trie.state_count() > 2000);
    }

    #[test]
    fn test_relocation_preserves_automaton() {
        let mut trie = BasicTrie::new();
        // dense fan-out from shared prefixes forces plenty of collisions
        for a in 0..26u8 {
            for z in 0..26u8 {
                let key = [b'a' + a, b'a' + z, b'q'];
                trie.insert(&key, (a as i32) * 26 + z as i32 + 1).unwrap();
            }
        }
        for a in 0..26u8 {
            for z in 0..26u8 {
                let key = [b'a' + a, b'a' + z, b'q'];
                assert_eq!(trie.search(&key), Some((a as i32) * 26 + z as i32 + 1));
            }
        }
        assert_automaton_consistent(&trie);
    }

    #[derive(Default)]
    struct RecordingHook {
        moves: Rc<RefCell<Vec<(StateId, StateId)>>>,
    }

    impl Relocator for RecordingHook {
        fn on_relocate(&mut self, states: &dyn StateTable, old: StateId, new: StateId) {
            // new cell must already be populated when the hook fires
            assert!(states.check(new) > 0);
            self.moves.borrow_mut().push((old, new));
        }
    }

    #[test]
    fn test_relocator_observes_moves() {
        let moves = Rc::new(RefCell::new(Vec::new()));
        let mut trie = BasicTrie::new();
        trie.set_relocator(Box::new(RecordingHook {
            moves: Rc::clone(&moves),
        }));
        for a in 0..16u8 {
            for z in 0..16u8 {
                trie.insert(&[a + 1, z + 1], (a as i32) * 16 + z as i32 + 1).unwrap();
            }
        }
        let moves = moves.borrow();
        assert!(!moves.is_empty());
        for &(old, new) in moves.iter() {
            assert_ne!(old, new);
        }
    }
}
