use serde::Serialize;

/// Byte range `[start, end)` consumed by one primitive read.
///
/// # Examples
/// ```
/// use bytelens_core::BoundaryPair;
///
/// let pair = BoundaryPair::new(3, 7);
/// assert_eq!(pair.len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BoundaryPair {
    pub start: u64,
    pub end: u64,
}

impl BoundaryPair {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(end >= start, "boundary end before start");
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// LIFO record of ranges produced by primitive reads and not yet attributed.
#[derive(Debug, Default)]
pub struct BoundaryStack {
    pairs: Vec<BoundaryPair>,
}

impl BoundaryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pair: BoundaryPair) {
        log::trace!("boundary push [{}, {})", pair.start, pair.end);
        self.pairs.push(pair);
    }

    pub fn pop(&mut self) -> Option<BoundaryPair> {
        self.pairs.pop()
    }

    pub fn peek(&self) -> Option<&BoundaryPair> {
        self.pairs.last()
    }

    /// Pop the top pair, then drop identical pairs directly beneath it while
    /// more than `keep` entries remain.
    ///
    /// A scalar decoded through several primitive reads over the same bytes
    /// leaves one pair per read; only the first belongs to the field.
    pub fn pop_collapsed(&mut self, keep: usize) -> Option<BoundaryPair> {
        let pair = self.pairs.pop()?;
        while self.pairs.len() > keep && self.pairs.last() == Some(&pair) {
            self.pairs.pop();
            log::trace!("boundary collapse [{}, {})", pair.start, pair.end);
        }
        Some(pair)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
