//! Monotonic counters used to order edits and evaluation requests.

use std::fmt;

/// Submission order of an evaluation request.
///
/// Assigned by the orchestrator handle when a request is submitted. A larger
/// sequence always means a more recently submitted request, regardless of
/// when its evaluation finishes.
///
/// # Example
///
/// ```
/// use splice_types::Sequence;
///
/// let first = Sequence::FIRST;
/// let second = first.next();
/// assert!(second > first);
/// assert_eq!(second.get(), 2);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sequence(u64);

impl Sequence {
    /// Sentinel for "nothing submitted yet". Never assigned to a request.
    pub const ZERO: Self = Self(0);

    /// The first sequence handed out.
    pub const FIRST: Self = Self(1);

    /// Wraps a raw counter value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the following sequence.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Edit counter of one source text (script or input).
///
/// Starts at [`Revision::INITIAL`] when the text is loaded and increases by
/// one on every wholesale replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(u64);

impl Revision {
    /// Revision of freshly loaded text.
    pub const INITIAL: Self = Self(0);

    /// Returns the raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the following revision.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_ordering() {
        let a = Sequence::FIRST;
        let b = a.next();
        assert!(Sequence::ZERO < a);
        assert_eq!(Sequence::default(), Sequence::ZERO);
        assert!(a < b);
        assert_eq!(b.to_string(), "#2");
    }

    #[test]
    fn revision_increments() {
        let r = Revision::INITIAL.next().next();
        assert_eq!(r.get(), 2);
        assert_eq!(r.to_string(), "r2");
    }
}
