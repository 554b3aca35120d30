mod arena;

use std::cell::RefCell;
use std::fmt;
use std::num::NonZeroU32;
use std::ops::Index;

use ahash::RandomState;
use arena::InternerArena;
use hashbrown::hash_table::Entry;
use hashbrown::HashTable;

/// An interned string. Only meaningful together with the [`Interner`] that
/// produced it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Istr(NonZeroU32);

impl Istr {
    fn from_index(index: usize) -> Self {
        let n = u32::try_from(index + 1).expect("too many interned strings");
        Self(NonZeroU32::new(n).expect("index + 1 is never zero"))
    }

    fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

impl fmt::Debug for Istr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Istr({})", self.0)
    }
}

/// String interner usable through a shared reference, so the lexers of
/// several source files can intern into it while other parts of the
/// front end hold [`Istr`]s and resolve them.
#[derive(Default)]
pub struct Interner {
    inner: RefCell<InternerInner>,
}

#[derive(Default)]
struct InternerInner {
    random_state: RandomState,
    lookup: HashTable<LookupEntry>,
    arena: InternerArena,
}

#[derive(Clone, Copy)]
struct LookupEntry {
    istr: Istr,
    hash: u64,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, s: &str) -> Istr {
        let mut inner = self.inner.borrow_mut();
        let inner = &mut *inner;

        let hash = inner.random_state.hash_one(s);

        let arena = &inner.arena;
        let entry = inner.lookup.entry(
            hash,
            // Safety: see `Interner::get`.
            |entry| arena.get(entry.istr.index()).is_some_and(|ptr| unsafe { &*ptr } == s),
            |entry| entry.hash,
        );

        match entry {
            Entry::Occupied(entry) => entry.get().istr,
            Entry::Vacant(entry) => {
                let istr = Istr::from_index(inner.arena.push_str(s));
                entry.insert(LookupEntry { istr, hash });
                istr
            }
        }
    }

    pub fn get(&self, istr: Istr) -> Option<&str> {
        let ptr = self.inner.borrow().arena.get(istr.index())?;

        // Safety:
        // - The arena never moves or deallocates its strings while `self` is
        //   alive, and interning only appends.
        // - There are no mutable references to the string.
        Some(unsafe { &*ptr })
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Index<Istr> for Interner {
    type Output = str;

    /// # Panics
    /// Panics if `istr` was produced by a different interner.
    fn index(&self, istr: Istr) -> &Self::Output {
        self.get(istr).expect("string not in this interner")
    }
}
