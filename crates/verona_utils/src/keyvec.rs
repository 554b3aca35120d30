use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut, Index, IndexMut};

/// A vector indexed by a typed key instead of `usize`.
pub struct KeyVec<K, V> {
    inner: Vec<V>,
    _phantom: PhantomData<fn(K) -> K>,
}

impl<K: Key, V> KeyVec<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn insert(&mut self, value: V) -> K {
        let key = K::from_usize(self.inner.len());
        self.inner.push(value);
        key
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.inner.get(key.as_usize())
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.inner.get_mut(key.as_usize())
    }

    pub fn keys(&self) -> impl Iterator<Item = K> {
        (0..self.inner.len()).map(K::from_usize)
    }

    pub fn iter_keyed(&self) -> impl Iterator<Item = (K, &V)> {
        self.inner
            .iter()
            .enumerate()
            .map(|(i, v)| (K::from_usize(i), v))
    }

    pub fn iter_keyed_mut(&mut self) -> impl Iterator<Item = (K, &mut V)> {
        self.inner
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (K::from_usize(i), v))
    }
}

impl<K, V> Default for KeyVec<K, V> {
    fn default() -> Self {
        Self {
            inner: vec![],
            _phantom: PhantomData,
        }
    }
}

impl<K, V> Deref for KeyVec<K, V> {
    type Target = [V];

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<K, V> DerefMut for KeyVec<K, V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<K: Key, V> Index<K> for KeyVec<K, V> {
    type Output = V;

    fn index(&self, key: K) -> &Self::Output {
        self.get(key).expect("key not found")
    }
}

impl<K: Key, V> IndexMut<K> for KeyVec<K, V> {
    fn index_mut(&mut self, key: K) -> &mut Self::Output {
        self.get_mut(key).expect("key not found")
    }
}

impl<K, V> IntoIterator for KeyVec<K, V> {
    type Item = V;
    type IntoIter = std::vec::IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, K, V> IntoIterator for &'a KeyVec<K, V> {
    type Item = &'a V;
    type IntoIter = std::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<K: Key + fmt::Debug, V: fmt::Debug> fmt::Debug for KeyVec<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter_keyed()).finish()
    }
}

impl<K, V: Clone> Clone for KeyVec<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<K, V: PartialEq> PartialEq for KeyVec<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<K, V: Eq> Eq for KeyVec<K, V> {}

pub trait Key: Copy {
    fn from_usize(n: usize) -> Self;
    fn as_usize(&self) -> usize;
}

#[macro_export]
macro_rules! declare_key_type {
    (
        $(#[$meta:meta])*
        $v:vis struct $i:ident;
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $(#[$meta])*
        $v struct $i(usize);

        impl $crate::keyvec::Key for $i {
            #[inline]
            fn from_usize(n: usize) -> Self {
                Self(n)
            }

            #[inline]
            fn as_usize(&self) -> usize {
                self.0
            }
        }
    };
}
pub use crate::declare_key_type;

#[cfg(test)]
mod tests {
    use super::{Key, KeyVec};

    declare_key_type! { struct TestId; }

    #[test]
    fn keys_follow_insertion_order() {
        let mut kv = KeyVec::new();

        let a: TestId = kv.insert("a");
        let b: TestId = kv.insert("b");

        assert_eq!(a.as_usize(), 0);
        assert_eq!(b.as_usize(), 1);
        assert_eq!(kv[b], "b");
        assert_eq!(kv.keys().collect::<Vec<_>>(), vec![a, b]);

        kv[a] = "c";
        assert_eq!(kv.iter_keyed().map(|(_, v)| *v).collect::<Vec<_>>(), ["c", "b"]);
    }

    #[test]
    fn missing_key() {
        let kv: KeyVec<TestId, ()> = KeyVec::new();
        assert!(kv.get(TestId::from_usize(0)).is_none());
    }
}
