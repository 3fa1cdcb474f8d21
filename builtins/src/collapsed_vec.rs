//! Vectors that share one backing pool.
//!
//! A [`CollapsedVec`] is an offset and a length into a [`CollapsedPool`]. Many tree nodes can keep
//! their variable-length children in the same contiguous allocation this way, at the cost that
//! only the most recently opened vector of a pool may grow. Generated loaders therefore fill one
//! vector completely before opening the next one on the same pool.

use std::{fmt, marker::PhantomData};

/// Backing storage for [`CollapsedVec`]s.
#[derive(Debug, Clone)]
pub struct CollapsedPool<T> {
    items: Vec<T>,
}

impl<T> Default for CollapsedPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CollapsedPool<T> {
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops all items but keeps the allocation. Vectors opened before are invalidated.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// An append-only vector stored in a shared [`CollapsedPool`].
pub struct CollapsedVec<T> {
    offset: u32,
    len: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> CollapsedVec<T> {
    /// A vector without items that is not open for appending.
    pub const fn empty() -> Self {
        Self {
            offset: 0,
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Opens a new vector at the end of `pool`.
    ///
    /// # Panics
    /// Panics if `pool` holds more than `u32::MAX` items.
    pub fn new(pool: &CollapsedPool<T>) -> Self {
        let offset =
            u32::try_from(pool.len()).expect("collapsed pool holds more than u32::MAX items");
        Self {
            offset,
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Appends `value`.
    ///
    /// # Panics
    /// Panics if another vector has been appended to `pool` since this one was opened. That is a
    /// bug in the calling code, never a property of the input document.
    pub fn push(&mut self, pool: &mut CollapsedPool<T>, value: T) {
        assert_eq!(
            self.offset as usize + self.len as usize,
            pool.len(),
            "push into a collapsed vector that is not the last one of its pool"
        );
        pool.items.push(value);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice<'p>(&self, pool: &'p CollapsedPool<T>) -> &'p [T] {
        &pool.items[self.range()]
    }

    pub fn as_mut_slice<'p>(&self, pool: &'p mut CollapsedPool<T>) -> &'p mut [T] {
        &mut pool.items[self.range()]
    }

    pub fn get<'p>(&self, pool: &'p CollapsedPool<T>, index: usize) -> Option<&'p T> {
        self.as_slice(pool).get(index)
    }

    pub fn get_mut<'p>(&self, pool: &'p mut CollapsedPool<T>, index: usize) -> Option<&'p mut T> {
        self.as_mut_slice(pool).get_mut(index)
    }

    pub fn first<'p>(&self, pool: &'p CollapsedPool<T>) -> Option<&'p T> {
        self.as_slice(pool).first()
    }

    pub fn last<'p>(&self, pool: &'p CollapsedPool<T>) -> Option<&'p T> {
        self.as_slice(pool).last()
    }

    pub fn iter<'p>(&self, pool: &'p CollapsedPool<T>) -> std::slice::Iter<'p, T> {
        self.as_slice(pool).iter()
    }

    fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.len as usize
    }
}

// derive(...) would require `T` to implement these traits as well, even though only offsets are
// stored.

impl<T> Copy for CollapsedVec<T> {}

impl<T> Clone for CollapsedVec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Default for CollapsedVec<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> PartialEq for CollapsedVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.len == other.len
    }
}

impl<T> Eq for CollapsedVec<T> {}

impl<T> fmt::Debug for CollapsedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollapsedVec[{}..+{}]", self.offset, self.len)
    }
}
