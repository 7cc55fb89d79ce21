//! The double trie: a front trie joined to a reversed rear trie.
//!
//! Keys enter the front trie until their paths diverge; the remainder is
//! appended to the rear trie back-to-front, so keys sharing a suffix share
//! one rear path. A front leaf with a negative `base` (a *separator*)
//! designates an index-table entry; the entry holds the stored value and
//! points through the accept table at the rear state where that key's
//! suffix starts. Referrer sets index the same mapping in reverse so rear
//! migrations and merges can rewrite every affected link.

use crate::config::TrieConfig;
use crate::error::{Result, TrieError};
use crate::fsa::basic_trie::{BasicTrie, ROOT};
use crate::fsa::traits::{LinkTables, Relocator, StateTable, TrieMap, TrieSearch};
use crate::fsa::{char_in, char_out, Symbol, TERMINATOR};
use crate::io::{pretty_size, SectionWriter};
use crate::{StateId, Value};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::rc::Rc;

#[cfg(feature = "mmap")]
use crate::fsa::basic_trie::RawStates;
#[cfg(feature = "mmap")]
use crate::io::{i32_at, u32_at, MappedFile, SectionReader};

const MAGIC: [u8; 16] = *b"TWO_TRIE\0\0\0\0\0\0\0\0";

/// One index-table entry: accept-table slot plus the stored value.
#[derive(Debug, Clone, Copy, Default)]
struct IndexCell {
    index: u32,
    data: Value,
}

/// One accept-table entry: a rear state id.
#[derive(Debug, Clone, Copy, Default)]
struct AcceptCell {
    accept: StateId,
}

/// Reverse side of an accept entry: its slot plus the front separators
/// currently linked through it.
#[derive(Debug, Clone, Default)]
struct Referer {
    accept_index: u32,
    referers: BTreeSet<StateId>,
}

/// The link tables shared between the trie and its relocator hooks.
///
/// `tracked_front`/`tracked_rear` hold state ids a multi-step operation is
/// standing on; the relocators rewrite them when those states migrate.
#[derive(Debug)]
struct LinkCore {
    index: Vec<IndexCell>,
    accept: Vec<AcceptCell>,
    refer: HashMap<StateId, Referer>,
    free_index: Vec<u32>,
    free_accept: Vec<u32>,
    next_index: u32,
    next_accept: u32,
    tracked_front: Vec<StateId>,
    tracked_rear: Vec<StateId>,
}

impl LinkCore {
    fn new(initial: usize) -> Self {
        let initial = initial.clamp(2, i32::MAX as usize);
        Self {
            index: vec![IndexCell::default(); initial],
            accept: vec![AcceptCell::default(); initial],
            refer: HashMap::new(),
            free_index: Vec::new(),
            free_accept: Vec::new(),
            next_index: 1,
            next_accept: 1,
            tracked_front: Vec::new(),
            tracked_rear: Vec::new(),
        }
    }

    /// Take a free index slot, growing the table if the cursor passes it.
    fn alloc_index(&mut self) -> u32 {
        if let Some(slot) = self.free_index.pop() {
            return slot;
        }
        let slot = self.next_index;
        self.next_index += 1;
        if slot as usize >= self.index.len() {
            let target = (self.index.len() * 2).max(slot as usize + 1);
            self.index.resize(target, IndexCell::default());
        }
        slot
    }

    /// Accept slot currently bound to rear state `t`, allocating one (and
    /// its referrer entry) if `t` has none.
    fn accept_slot(&mut self, t: StateId) -> u32 {
        if let Some(entry) = self.refer.get(&t) {
            return entry.accept_index;
        }
        let slot = self.free_accept.pop().unwrap_or_else(|| {
            let slot = self.next_accept;
            self.next_accept += 1;
            slot
        });
        if slot as usize >= self.accept.len() {
            let target = (self.accept.len() * 2).max(slot as usize + 1);
            self.accept.resize(target, AcceptCell::default());
        }
        self.accept[slot as usize].accept = t;
        self.refer.insert(
            t,
            Referer {
                accept_index: slot,
                referers: BTreeSet::new(),
            },
        );
        slot
    }

    /// Drop the accept slot and referrer entry of rear state `t`, if any.
    fn free_accept_entry(&mut self, t: StateId) {
        if let Some(entry) = self.refer.remove(&t) {
            if entry.accept_index > 0 {
                if let Some(cell) = self.accept.get_mut(entry.accept_index as usize) {
                    *cell = AcceptCell::default();
                }
                self.free_accept.push(entry.accept_index);
            }
        }
    }

    fn count_referer(&self, t: StateId) -> usize {
        self.refer.get(&t).map(|e| e.referers.len()).unwrap_or(0)
    }

    fn track_front(&mut self, id: StateId) -> usize {
        self.tracked_front.push(id);
        self.tracked_front.len() - 1
    }

    fn track_rear(&mut self, id: StateId) -> usize {
        self.tracked_rear.push(id);
        self.tracked_rear.len() - 1
    }
}

impl LinkTables for LinkCore {
    fn index_entry(&self, slot: u32) -> Option<(u32, Value)> {
        if slot == 0 {
            return None;
        }
        self.index.get(slot as usize).map(|c| (c.index, c.data))
    }

    fn accept_state(&self, slot: u32) -> Option<StateId> {
        if slot == 0 {
            return None;
        }
        self.accept.get(slot as usize).map(|c| c.accept)
    }
}

/// Front hook: a moved separator must be renamed inside the referrer set of
/// the accept entry it links through.
struct FrontRelocator {
    core: Rc<RefCell<LinkCore>>,
}

impl Relocator for FrontRelocator {
    fn on_relocate(&mut self, states: &dyn StateTable, old: StateId, new: StateId) {
        let mut core = self.core.borrow_mut();
        let b = states.base(new);
        if b < 0 {
            let j = core
                .index
                .get((-b) as usize)
                .map(|c| c.index)
                .unwrap_or(0);
            let u = core.accept.get(j as usize).map(|c| c.accept).unwrap_or(0);
            if u > 0 {
                if let Some(entry) = core.refer.get_mut(&u) {
                    if entry.referers.remove(&old) {
                        entry.referers.insert(new);
                    }
                }
            }
        }
        for id in core.tracked_front.iter_mut() {
            if *id == old {
                *id = new;
            }
        }
    }
}

/// Rear hook: a moved accept state owns its accept-table cell and referrer
/// entry under its id, so both are rekeyed.
struct RearRelocator {
    core: Rc<RefCell<LinkCore>>,
}

impl Relocator for RearRelocator {
    fn on_relocate(&mut self, _states: &dyn StateTable, old: StateId, new: StateId) {
        let mut core = self.core.borrow_mut();
        if let Some(entry) = core.refer.remove(&old) {
            if let Some(cell) = core.accept.get_mut(entry.accept_index as usize) {
                cell.accept = new;
            }
            core.refer.insert(new, entry);
        }
        for id in core.tracked_rear.iter_mut() {
            if *id == old {
                *id = new;
            }
        }
    }
}

/// A mutable double trie.
///
/// # Examples
///
/// ```rust
/// use twintrie::{DoubleTrie, TrieMap, TrieSearch};
///
/// let mut trie = DoubleTrie::new();
/// trie.insert(b"card", 2).unwrap();
/// trie.insert(b"care", 3).unwrap();
/// assert_eq!(trie.search(b"card"), Some(2));
/// assert_eq!(trie.search(b"car"), None);
/// ```
pub struct DoubleTrie {
    lhs: BasicTrie,
    rhs: BasicTrie,
    core: Rc<RefCell<LinkCore>>,
}

impl DoubleTrie {
    /// Create an empty double trie.
    pub fn new() -> Self {
        Self::from_config(TrieConfig::default())
    }

    /// Create an empty double trie with explicit sizing.
    pub fn with_config(config: TrieConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: TrieConfig) -> Self {
        let core = Rc::new(RefCell::new(LinkCore::new(config.initial_index)));
        let mut lhs = BasicTrie::with_capacity(config.initial_states);
        let mut rhs = BasicTrie::with_capacity(config.initial_states);
        lhs.set_relocator(Box::new(FrontRelocator {
            core: Rc::clone(&core),
        }));
        rhs.set_relocator(Box::new(RearRelocator {
            core: Rc::clone(&core),
        }));
        Self { lhs, rhs, core }
    }

    fn is_separator(&self, s: StateId) -> bool {
        self.lhs.base(s) < 0
    }

    /// The rear state linked from separator `s`, or 0.
    fn link_state(&self, s: StateId) -> StateId {
        let core = self.core.borrow();
        let slot = (-self.lhs.base(s)) as u32;
        core.index_entry(slot)
            .and_then(|(j, _)| core.accept_state(j))
            .unwrap_or(0)
    }

    fn count_referer(&self, t: StateId) -> usize {
        self.core.borrow().count_referer(t)
    }

    /// Bind front leaf `s` to rear state `t`, reusing `s`'s index slot if it
    /// already has one. Returns the index slot.
    fn set_link(&mut self, s: StateId, t: StateId) -> u32 {
        let mut core = self.core.borrow_mut();
        let slot = if self.lhs.base(s) < 0 {
            (-self.lhs.base(s)) as u32
        } else {
            core.alloc_index()
        };
        let j = core.accept_slot(t);
        if let Some(cell) = core.index.get_mut(slot as usize) {
            cell.index = j;
        }
        if let Some(entry) = core.refer.get_mut(&t) {
            entry.referers.insert(s);
        }
        drop(core);
        self.lhs.set_base(s, -(slot as i32));
        slot
    }

    /// Append a key segment into the rear trie back-to-front, reusing an
    /// existing shared suffix path where possible. Returns the rear state
    /// marking the start of the segment.
    fn rhs_append(&mut self, bytes: &[u8]) -> Result<StateId> {
        let mut s = ROOT;
        let mut remaining = bytes.len();
        if let Some(t) = self.rhs.transition(ROOT, TERMINATOR) {
            let (reached, rest) = self.rhs.go_forward_reverse(t, bytes);
            if rest == 0 {
                // fully shared: reuse the reached state, or mark it with an
                // explicit terminator child when it sits mid-path
                if self.rhs.outdegree(reached) == 0 {
                    return Ok(reached);
                }
                if let Some(tt) = self.rhs.transition(reached, TERMINATOR) {
                    return Ok(tt);
                }
                return self.rhs.create_transition(reached, TERMINATOR);
            }
            s = reached;
            remaining = rest;
        }
        if s != ROOT && self.rhs.outdegree(s) == 0 {
            // s marks an existing shorter suffix; its accept role moves down
            // a terminator child before the path grows past it
            let (rbase, slot) = {
                let mut core = self.core.borrow_mut();
                (core.tracked_rear.len(), core.track_rear(s))
            };
            let t = self.rhs.create_transition(s, TERMINATOR)?;
            let s_now = self.core.borrow().tracked_rear[slot];
            let referers: Vec<StateId> = self
                .core
                .borrow()
                .refer
                .get(&s_now)
                .map(|e| e.referers.iter().copied().collect())
                .unwrap_or_default();
            for f in referers {
                self.set_link(f, t);
            }
            let mut core = self.core.borrow_mut();
            core.free_accept_entry(s_now);
            core.tracked_rear.truncate(rbase);
            drop(core);
            s = s_now;
        }
        if s == ROOT {
            remaining = bytes.len();
            s = self.rhs.create_transition(ROOT, TERMINATOR)?;
        }
        for i in (0..remaining).rev() {
            s = self.rhs.create_transition(s, char_in(bytes[i]))?;
        }
        Ok(s)
    }

    /// Case A of insertion: grow the front by one transition and hand the
    /// rest of the key to the rear store.
    fn lhs_insert(&mut self, s: StateId, residual: &[u8]) -> Result<u32> {
        let t = self.lhs.create_transition(s, char_in(residual[0]))?;
        let r = self.rhs_append(&residual[1..])?;
        Ok(self.set_link(t, r))
    }

    fn remove_accept_state(&mut self, t: StateId) {
        self.core.borrow_mut().free_accept_entry(t);
        self.rhs.set_base(t, 0);
        self.rhs.set_check(t, 0);
    }

    /// Absorb a lone terminator child of `t` into `t` itself. Reports
    /// whether anything was absorbed.
    fn rhs_clean_one(&mut self, t: StateId) -> bool {
        if self.rhs.outdegree(t) == 1 {
            if let Some(r) = self.rhs.transition(t, TERMINATOR) {
                let referers: Vec<StateId> = self
                    .core
                    .borrow()
                    .refer
                    .get(&r)
                    .map(|e| e.referers.iter().copied().collect())
                    .unwrap_or_default();
                for f in referers {
                    self.set_link(f, t);
                }
                self.remove_accept_state(r);
                return true;
            }
        }
        false
    }

    /// Walk rear parents removing states that neither branch nor carry
    /// referrers, stopping at the first non-collapsible ancestor; a lone
    /// terminator child at the stop state is absorbed.
    fn rhs_clean_more(&mut self, t: StateId) {
        if t <= ROOT {
            return;
        }
        if self.rhs.outdegree(t) == 0 && self.count_referer(t) == 0 {
            let parent = self.rhs.prev(t);
            self.remove_accept_state(t);
            if parent > ROOT {
                self.rhs_clean_more(parent);
            }
        } else if self.rhs.outdegree(t) == 1 {
            if let Some(r) = self.rhs.transition(t, TERMINATOR) {
                let referers: Vec<StateId> = self
                    .core
                    .borrow()
                    .refer
                    .get(&r)
                    .map(|e| e.referers.iter().copied().collect())
                    .unwrap_or_default();
                for f in referers {
                    self.set_link(f, t);
                }
                self.remove_accept_state(r);
            }
        }
    }

    /// Split a shared rear path: separator `s` and the incoming key part
    /// ways from the stored suffix at rear state `r`.
    ///
    /// `matched` is the byte run both keys share past the separator,
    /// `remain` what is left of the incoming key after it, and
    /// `ch`/`terminator` the edge the stored suffix continues with.
    #[allow(clippy::too_many_arguments)]
    fn rhs_insert(
        &mut self,
        s: StateId,
        r: StateId,
        matched: &[u8],
        remain: &[u8],
        ch: u8,
        terminator: bool,
        value: Value,
    ) -> Result<()> {
        // R-1: release s's index entry and its claim on the old accept state
        let u = self.link_state(s);
        let slot = (-self.lhs.base(s)) as u32;
        let (oval, fbase, rbase, stand_slot, orphan_slot) = {
            let mut core = self.core.borrow_mut();
            let oval = core.index.get(slot as usize).map(|c| c.data).unwrap_or(0);
            if let Some(cell) = core.index.get_mut(slot as usize) {
                *cell = IndexCell::default();
            }
            core.free_index.push(slot);
            let fbase = core.tracked_front.len();
            let rbase = core.tracked_rear.len();
            let stand_slot = core.track_rear(r);
            let orphan_slot = core.track_rear(u);
            (oval, fbase, rbase, stand_slot, orphan_slot)
        };
        self.lhs.set_base(s, 0);
        if u > 0 {
            let mut core = self.core.borrow_mut();
            let emptied = core
                .refer
                .get_mut(&u)
                .map(|e| {
                    e.referers.remove(&s);
                    e.referers.is_empty()
                })
                .unwrap_or(false);
            if emptied {
                core.free_accept_entry(u);
            }
        }

        // R-2: regrow the shared run on the front, then place the new key
        let mut fork = s;
        for &b in matched {
            fork = self.lhs.create_transition(fork, char_in(b))?;
        }
        let fork_slot = self.core.borrow_mut().track_front(fork);
        if !remain.is_empty() {
            let t = self.lhs.create_transition(fork, char_in(remain[0]))?;
            let r2 = self.rhs_append(&remain[1..])?;
            let i = self.set_link(t, r2);
            if let Some(cell) = self.core.borrow_mut().index.get_mut(i as usize) {
                cell.data = value;
            }
        } else {
            let t = self.lhs.create_transition(fork, TERMINATOR)?;
            self.lhs.set_base(t, value);
        }

        // R-3: reattach the stored suffix under the fork
        let fork = self.core.borrow().tracked_front[fork_slot];
        let edge = if terminator { TERMINATOR } else { char_in(ch) };
        let t = self.lhs.create_transition(fork, edge)?;
        let stand = self.core.borrow().tracked_rear[stand_slot];
        let v = self.rhs.prev(stand);
        let anchor = match self.rhs.transition(v, TERMINATOR) {
            Some(a) => a,
            None => self.rhs.create_transition(v, TERMINATOR)?,
        };
        let i = self.set_link(t, anchor);
        if let Some(cell) = self.core.borrow_mut().index.get_mut(i as usize) {
            cell.data = oval;
        }

        // R-4: collapse whatever the unlink left dangling
        let orphan = {
            let mut core = self.core.borrow_mut();
            let orphan = core.tracked_rear[orphan_slot];
            core.tracked_front.truncate(fbase);
            core.tracked_rear.truncate(rbase);
            orphan
        };
        if orphan > 0 && !self.rhs_clean_one(orphan) {
            self.rhs_clean_more(orphan);
        }
        Ok(())
    }
}

impl Default for DoubleTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DoubleTrie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.core.borrow();
        f.debug_struct("DoubleTrie")
            .field("front_states", &self.lhs.state_count())
            .field("rear_states", &self.rhs.state_count())
            .field("index_entries", &core.next_index)
            .field("accept_entries", &core.next_accept)
            .finish()
    }
}

impl TrieSearch for DoubleTrie {
    fn search(&self, key: &[u8]) -> Option<Value> {
        let core = self.core.borrow();
        double_search(&self.lhs, &self.rhs, &*core, key)
    }
}

impl TrieMap for DoubleTrie {
    fn insert(&mut self, key: &[u8], value: Value) -> Result<()> {
        if value <= 0 {
            return Err(TrieError::invalid_value(value));
        }
        if key.is_empty() {
            return Err(TrieError::invalid_argument("empty key"));
        }

        let (s, p) = self.lhs.go_forward(ROOT, key);
        if !self.is_separator(s) {
            if p < key.len() {
                let slot = self.lhs_insert(s, &key[p..])?;
                if let Some(cell) = self.core.borrow_mut().index.get_mut(slot as usize) {
                    cell.data = value;
                }
                return Ok(());
            }
            // whole key consumed on an inner front state
            match self.lhs.transition(s, TERMINATOR) {
                Some(t) => {
                    let b = self.lhs.base(t);
                    if b < 0 {
                        if let Some(cell) = self.core.borrow_mut().index.get_mut((-b) as usize) {
                            cell.data = value;
                        }
                    } else {
                        self.lhs.set_base(t, value);
                    }
                }
                None => {
                    let t = self.lhs.create_transition(s, TERMINATOR)?;
                    self.lhs.set_base(t, value);
                }
            }
            return Ok(());
        }

        // the front bottomed out on a shared suffix: match against the rear
        let mut r = self.link_state(s);
        debug_assert!(r != 0, "separator {} has no live accept entry", s);
        if self.rhs.check_reverse_transition(r, TERMINATOR) && self.rhs.prev(r) > ROOT {
            r = self.rhs.prev(r);
        }
        let mut matched = Vec::new();
        let mut p = p;
        while p < key.len() && self.rhs.check_reverse_transition(r, char_in(key[p])) {
            r = self.rhs.prev(r);
            matched.push(key[p]);
            p += 1;
        }
        if p >= key.len() && self.rhs.check_reverse_transition(r, TERMINATOR) {
            r = self.rhs.prev(r);
        }
        if r == ROOT {
            // full match including the terminator: plain overwrite
            let slot = (-self.lhs.base(s)) as usize;
            if let Some(cell) = self.core.borrow_mut().index.get_mut(slot) {
                cell.data = value;
            }
            return Ok(());
        }
        let v = self.rhs.prev(r);
        let edge = r as i64 - self.rhs.base(v) as i64;
        let terminator = edge == TERMINATOR as i64;
        let last = if terminator { 0 } else { char_out(edge as Symbol) };
        self.rhs_insert(s, r, &matched, &key[p..], last, terminator, value)
    }

    fn build<P: AsRef<Path>>(&self, path: P, verbose: bool) -> Result<()> {
        let core = self.core.borrow();
        let file = File::create(path)?;
        let mut w = SectionWriter::new(BufWriter::new(file));
        w.write_bytes(&MAGIC)?;
        w.write_u32(core.next_index)?;
        w.write_u32(core.next_accept)?;
        for cell in core.index.iter().take(core.next_index as usize) {
            w.write_u32(cell.index)?;
            w.write_i32(cell.data)?;
        }
        for cell in core.accept.iter().take(core.next_accept as usize) {
            w.write_u32(cell.accept)?;
        }
        self.lhs.write_section(&mut w)?;
        self.rhs.write_section(&mut w)?;
        w.flush()?;
        if verbose {
            let index = core.next_index as usize * 8;
            let accept = core.next_accept as usize * 4;
            let front = self.lhs.section_bytes();
            let rear = self.rhs.section_bytes();
            log::info!(
                "index = {}, accept = {}, front = {}, rear = {}, total = {}",
                pretty_size(index),
                pretty_size(accept),
                pretty_size(front),
                pretty_size(rear),
                pretty_size(index + accept + front + rear),
            );
        }
        Ok(())
    }
}

/// Search shared by the owned trie and the mapped view.
pub(crate) fn double_search<F, R, L>(front: &F, rear: &R, links: &L, key: &[u8]) -> Option<Value>
where
    F: StateTable + ?Sized,
    R: StateTable + ?Sized,
    L: LinkTables + ?Sized,
{
    let (s, p) = front.go_forward(ROOT, key);
    let separator = front.base(s) < 0;
    if p < key.len() && !separator {
        return None;
    }
    if p == key.len() {
        if let Some(t) = front.transition(s, TERMINATOR) {
            let b = front.base(t);
            return if b < 0 {
                links.index_entry((-b) as u32).map(|(_, data)| data)
            } else {
                (b > 0).then_some(b)
            };
        }
        if !separator {
            return None;
        }
    }
    let (j, data) = links.index_entry((-front.base(s)) as u32)?;
    let mut r = links.accept_state(j)?;
    if rear.check_reverse_transition(r, TERMINATOR) {
        r = rear.prev(r);
    }
    let r = rear.go_backward(r, &key[p..])?;
    (rear.prev(r) == ROOT).then_some(data)
}

/// Byte offsets of the sections inside a mapped double trie file.
#[cfg(feature = "mmap")]
#[derive(Debug, Clone, Copy)]
struct DoubleLayout {
    index_off: usize,
    index_count: u32,
    accept_off: usize,
    accept_count: u32,
    front_off: usize,
    front_count: u32,
    rear_off: usize,
    rear_count: u32,
}

#[cfg(feature = "mmap")]
impl DoubleLayout {
    fn parse(data: &[u8]) -> Result<Self> {
        let mut r = SectionReader::new(data);
        let magic = r.read_bytes(16)?;
        if magic != MAGIC {
            return Err(TrieError::corrupt_file("not a double trie file"));
        }
        let index_count = r.read_u32()?;
        let accept_count = r.read_u32()?;
        let index_off = r.position();
        let index_bytes = (index_count as usize)
            .checked_mul(8)
            .ok_or_else(|| TrieError::corrupt_file("index table overflow"))?;
        r.read_bytes(index_bytes)?;
        let accept_off = r.position();
        let accept_bytes = (accept_count as usize)
            .checked_mul(4)
            .ok_or_else(|| TrieError::corrupt_file("accept table overflow"))?;
        r.read_bytes(accept_bytes)?;
        let front_hdr = r.position();
        let front = RawStates::parse(&mut r)?;
        let front_count = front.state_count();
        let rear_hdr = r.position();
        let rear = RawStates::parse(&mut r)?;
        let rear_count = rear.state_count();
        Ok(Self {
            index_off,
            index_count,
            accept_off,
            accept_count,
            front_off: front_hdr + 8,
            front_count,
            rear_off: rear_hdr + 8,
            rear_count,
        })
    }
}

/// A double trie loaded read-only from a built file.
///
/// Holds the file mapped for its whole lifetime and interprets the tables in
/// place; only lookups are possible on a loaded instance.
#[cfg(feature = "mmap")]
#[derive(Debug)]
pub struct MappedDoubleTrie {
    map: MappedFile,
    layout: DoubleLayout,
}

#[cfg(feature = "mmap")]
impl MappedDoubleTrie {
    /// Map the file built by [`DoubleTrie::build`] at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let map = MappedFile::open(path)?;
        let layout = DoubleLayout::parse(map.as_slice())?;
        log::debug!(
            "loaded double trie: {} front states, {} rear states, {} index entries",
            layout.front_count,
            layout.rear_count,
            layout.index_count
        );
        Ok(Self { map, layout })
    }

    fn front(&self) -> RawStates<'_> {
        let off = self.layout.front_off;
        let len = self.layout.front_count as usize * 8;
        RawStates::new(&self.map.as_slice()[off..off + len], self.layout.front_count)
    }

    fn rear(&self) -> RawStates<'_> {
        let off = self.layout.rear_off;
        let len = self.layout.rear_count as usize * 8;
        RawStates::new(&self.map.as_slice()[off..off + len], self.layout.rear_count)
    }
}

#[cfg(feature = "mmap")]
impl LinkTables for MappedDoubleTrie {
    fn index_entry(&self, slot: u32) -> Option<(u32, Value)> {
        if slot == 0 || slot >= self.layout.index_count {
            return None;
        }
        let off = self.layout.index_off + slot as usize * 8;
        let data = self.map.as_slice();
        Some((u32_at(data, off), i32_at(data, off + 4)))
    }

    fn accept_state(&self, slot: u32) -> Option<StateId> {
        if slot == 0 || slot >= self.layout.accept_count {
            return None;
        }
        let off = self.layout.accept_off + slot as usize * 4;
        Some(u32_at(self.map.as_slice(), off))
    }
}

#[cfg(feature = "mmap")]
impl TrieSearch for MappedDoubleTrie {
    fn search(&self, key: &[u8]) -> Option<Value> {
        double_search(&self.front(), &self.rear(), self, key)
    }
}
