use std::fmt;

/// Number of `u64` words needed for `bits` presence bits.
pub const fn words_for(bits: usize) -> usize {
    bits.div_ceil(64)
}

/// Fixed-size bit vector indexed by member ordinals.
///
/// The word count is chosen per type when the schema is compiled, see [`words_for`].
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct PresenceBits<const WORDS: usize>([u64; WORDS]);

impl<const WORDS: usize> Default for PresenceBits<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WORDS: usize> PresenceBits<WORDS> {
    pub const fn new() -> Self {
        Self([0; WORDS])
    }

    pub const fn from_words(words: [u64; WORDS]) -> Self {
        Self(words)
    }

    pub const fn from_ordinals(ordinals: &[usize]) -> Self {
        let mut words = [0; WORDS];
        let mut i = 0;
        while i < ordinals.len() {
            words[ordinals[i] / 64] |= 1 << (ordinals[i] % 64);
            i += 1;
        }
        Self(words)
    }

    pub const fn words(&self) -> &[u64; WORDS] {
        &self.0
    }

    /// Sets the bit for `ordinal` and returns whether it was unset before.
    pub fn insert(&mut self, ordinal: usize) -> bool {
        let mask = 1 << (ordinal % 64);
        let word = &mut self.0[ordinal / 64];
        let fresh = *word & mask == 0;
        *word |= mask;
        fresh
    }

    pub fn contains(&self, ordinal: usize) -> bool {
        self.0[ordinal / 64] & (1 << (ordinal % 64)) != 0
    }

    /// Bits set in `self` but not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let mut words = self.0;
        for (word, other) in words.iter_mut().zip(other.0.iter()) {
            *word &= !other;
        }
        Self(words)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&word| word == 0)
    }

    pub fn len(&self) -> usize {
        self.0.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn clear(&mut self) {
        self.0 = [0; WORDS];
    }

    /// Set ordinals in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(index, &word)| {
            (0..64)
                .filter(move |bit| word & (1 << bit) != 0)
                .map(move |bit| index * 64 + bit)
        })
    }
}

impl<const WORDS: usize> fmt::Debug for PresenceBits<WORDS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
