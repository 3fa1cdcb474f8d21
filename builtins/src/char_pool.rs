//! Arena for string data captured while parsing a document.
//!
//! Strings are copied into chunks that are never moved or resized, so every `&str` handed out by
//! [`CharPool::add`] stays valid for as long as the pool is borrowed. Chunk capacities grow
//! geometrically, which keeps the number of allocations logarithmic in the amount of text.

use std::{
    cell::{Cell, RefCell},
    collections::{hash_map::DefaultHasher, HashMap},
    hash::{Hash, Hasher},
    ptr::NonNull,
};

/// Capacity of the first chunk of a pool created with [`CharPool::new`].
pub const DEFAULT_CAPACITY: usize = 1024;

struct Chunk {
    mem: NonNull<[u8]>,
    used: usize,
}

impl Chunk {
    fn new(capacity: usize) -> Self {
        let mem = vec![0u8; capacity].into_boxed_slice();
        Self {
            mem: NonNull::from(Box::leak(mem)),
            used: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.mem.len()
    }

    fn fits(&self, len: usize) -> bool {
        self.capacity() - self.used >= len
    }

    /// Copies `bytes` followed by a NUL terminator behind the used region and returns the start of
    /// the copy.
    fn push(&mut self, bytes: &[u8]) -> *const u8 {
        assert!(self.fits(bytes.len() + 1));
        let base = self.mem.as_ptr().cast::<u8>();
        // SAFETY: the assertion above keeps the write inside the buffer, and the region behind
        // `used` has never been handed out.
        unsafe {
            let out = base.add(self.used);
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), out, bytes.len());
            out.add(bytes.len()).write(0);
            self.used += bytes.len() + 1;
            out
        }
    }

    fn reset(&mut self) {
        // SAFETY: only called through `&mut CharPool`, so no reference into the buffer is alive.
        unsafe {
            self.mem
                .as_ptr()
                .cast::<u8>()
                .write_bytes(0, self.capacity());
        }
        self.used = 0;
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        // SAFETY: `mem` was produced by `Box::leak` in `Chunk::new` and is released exactly once.
        unsafe { drop(Box::from_raw(self.mem.as_ptr())) }
    }
}

#[derive(Copy, Clone)]
struct Span {
    start: NonNull<u8>,
    len: usize,
}

/// A pool for string data, managed as a list of chunks with exponentially increasing sizes.
///
/// The pool is meant to be owned by a single parse session. It is not `Sync`; independent parses
/// use independent pools.
pub struct CharPool {
    chunks: RefCell<Vec<Chunk>>,
    interned: RefCell<HashMap<u64, Vec<Span>>>,
    strings: Cell<usize>,
    initial_capacity: usize,
}

impl Default for CharPool {
    fn default() -> Self {
        Self::new()
    }
}

impl CharPool {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a pool whose first chunk holds `capacity` bytes. Every stored string also occupies
    /// one byte for its terminator.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            chunks: RefCell::new(vec![Chunk::new(capacity)]),
            interned: RefCell::new(HashMap::new()),
            strings: Cell::new(0),
            initial_capacity: capacity,
        }
    }

    /// Copies `bytes` into the pool and returns the copy.
    ///
    /// The first chunk (in creation order) with enough room receives the data. If none has room, a
    /// new chunk of `max(2 * last chunk capacity, bytes.len() + 1)` bytes is appended.
    pub fn add_bytes(&self, bytes: &[u8]) -> &[u8] {
        let needed = bytes.len() + 1;
        let mut chunks = self.chunks.borrow_mut();
        let start = match chunks.iter_mut().find(|chunk| chunk.fits(needed)) {
            Some(chunk) => chunk.push(bytes),
            None => {
                let last_capacity = chunks
                    .last()
                    .map_or(self.initial_capacity, Chunk::capacity);
                let mut chunk = Chunk::new(last_capacity.saturating_mul(2).max(needed));
                let start = chunk.push(bytes);
                chunks.push(chunk);
                start
            }
        };
        self.strings.set(self.strings.get() + 1);
        // SAFETY: `start` points at `bytes.len()` initialized bytes inside a chunk buffer. Buffers
        // never move, and they are only rewritten or freed through `&mut self`, which cannot
        // coexist with the returned borrow.
        unsafe { std::slice::from_raw_parts(start, bytes.len()) }
    }

    /// Copies `s` into the pool and returns the copy.
    pub fn add(&self, s: &str) -> &str {
        let bytes = self.add_bytes(s.as_bytes());
        // SAFETY: `bytes` is an exact copy of a `str`.
        unsafe { std::str::from_utf8_unchecked(bytes) }
    }

    /// Like [`add`](Self::add), but returns the earlier copy if an equal string was interned
    /// before.
    pub fn intern(&self, s: &str) -> &str {
        let hash = {
            let mut hasher = DefaultHasher::new();
            s.hash(&mut hasher);
            hasher.finish()
        };

        if let Some(spans) = self.interned.borrow().get(&hash) {
            for span in spans {
                // SAFETY: spans are only recorded for strings copied into live chunks, and the
                // index is emptied by `clear`.
                let existing = unsafe { std::slice::from_raw_parts(span.start.as_ptr(), span.len) };
                if existing == s.as_bytes() {
                    // SAFETY: interned spans always hold complete `str` copies.
                    return unsafe { std::str::from_utf8_unchecked(existing) };
                }
            }
        }

        let copy = self.add(s);
        self.interned.borrow_mut().entry(hash).or_default().push(Span {
            start: NonNull::from(copy.as_bytes()).cast(),
            len: copy.len(),
        });
        copy
    }

    /// Frees all chunks except the first one and leaves the pool in a usable state.
    pub fn clear(&mut self) {
        let chunks = self.chunks.get_mut();
        chunks.truncate(1);
        if let Some(first) = chunks.first_mut() {
            first.reset();
        }
        self.interned.get_mut().clear();
        self.strings.set(0);
    }

    /// Number of strings stored since creation or the last [`clear`](Self::clear).
    pub fn len(&self) -> usize {
        self.strings.get()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.borrow().len()
    }

    /// Total capacity of all chunks in bytes.
    pub fn allocated_bytes(&self) -> usize {
        self.chunks.borrow().iter().map(Chunk::capacity).sum()
    }
}

impl std::fmt::Debug for CharPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharPool")
            .field("strings", &self.len())
            .field("chunks", &self.chunk_count())
            .field("allocated_bytes", &self.allocated_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_survive_chunk_splits() {
        let pool = CharPool::with_capacity(2);
        let a = pool.add("a");
        let b = pool.add("bb");
        let c = pool.add("ccc");
        assert_eq!(a, "a");
        assert_eq!(b, "bb");
        assert_eq!(c, "ccc");
        assert_eq!(pool.chunk_count(), 3);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn copies_are_nul_terminated() {
        let pool = CharPool::with_capacity(16);
        let s = pool.add("xyz");
        let terminator = unsafe { *s.as_ptr().add(s.len()) };
        assert_eq!(terminator, 0);
    }

    #[test]
    fn earlier_chunks_are_filled_first() {
        let pool = CharPool::with_capacity(4);
        pool.add("a");
        pool.add("bcdef");
        assert_eq!(pool.allocated_bytes(), 4 + 8);
        // Two bytes are still free in the first chunk.
        let g = pool.add("g");
        assert_eq!(g, "g");
        assert_eq!(pool.chunk_count(), 2);
        assert_eq!(pool.allocated_bytes(), 4 + 8);
    }

    #[test]
    fn oversized_input_gets_its_own_chunk() {
        let pool = CharPool::with_capacity(4);
        let long = "x".repeat(100);
        let copy = pool.add(&long);
        assert_eq!(copy, long);
        assert_eq!(pool.allocated_bytes(), 4 + 101);
    }

    #[test]
    fn empty_strings_take_one_byte() {
        let pool = CharPool::with_capacity(1);
        assert_eq!(pool.add(""), "");
        assert_eq!(pool.chunk_count(), 1);
        assert_eq!(pool.add(""), "");
        assert_eq!(pool.chunk_count(), 2);
    }

    #[test]
    fn clear_keeps_only_the_first_chunk() {
        let mut pool = CharPool::with_capacity(4);
        pool.add("abc");
        pool.add("defghijk");
        assert_eq!(pool.chunk_count(), 2);

        pool.clear();
        assert_eq!(pool.chunk_count(), 1);
        assert_eq!(pool.allocated_bytes(), 4);
        assert!(pool.is_empty());

        assert_eq!(pool.add("abc"), "abc");
        assert_eq!(pool.chunk_count(), 1);
    }

    #[test]
    fn intern_returns_the_first_copy() {
        let pool = CharPool::new();
        let first = pool.intern("element");
        let other = pool.intern("attribute");
        let again = pool.intern("element");
        assert_eq!(first.as_ptr(), again.as_ptr());
        assert_ne!(first.as_ptr(), other.as_ptr());
        assert_eq!(pool.len(), 2);

        // Plain `add` never deduplicates.
        let copy = pool.add("element");
        assert_ne!(copy.as_ptr(), first.as_ptr());
    }

    #[test]
    fn intern_index_is_dropped_on_clear() {
        let mut pool = CharPool::new();
        pool.intern("a");
        pool.clear();
        assert_eq!(pool.intern("a"), "a");
        assert_eq!(pool.len(), 1);
    }
}
