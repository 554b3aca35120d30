use bumpalo::Bump;

/// Append-only string storage. Strings are never moved or freed while the
/// arena is alive, so pointers handed out by [`InternerArena::get`] stay
/// valid for the arena's lifetime.
#[derive(Default)]
pub struct InternerArena {
    strs: Vec<*const str>,
    alloc: Bump,
}

impl InternerArena {
    #[inline]
    pub fn push_str(&mut self, s: &str) -> usize {
        let index = self.strs.len();

        let s = &*self.alloc.alloc_str(s);
        self.strs.push(s as *const str);

        index
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<*const str> {
        self.strs.get(index).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strs.len()
    }
}
