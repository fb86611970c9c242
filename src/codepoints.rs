use std::collections::BTreeSet;
use std::fmt::{self, Debug, Formatter};

/// A set of Unicode scalar values.
///
/// Kept ordered, so that leftovers and diagnostics come out deterministic.
#[derive(Default, Clone, Eq, PartialEq, Hash)]
pub struct CodepointSet(BTreeSet<u32>);

impl CodepointSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Create a set with every `char` of a string.
    pub fn from_text(text: &str) -> Self {
        text.chars().map(u32::from).collect()
    }

    /// Add a codepoint. Returns whether it was newly inserted.
    pub fn insert(&mut self, codepoint: u32) -> bool {
        self.0.insert(codepoint)
    }

    /// Remove a codepoint. Returns whether it was present.
    pub fn remove(&mut self, codepoint: u32) -> bool {
        self.0.remove(&codepoint)
    }

    /// Whether the set contains a codepoint.
    pub fn contains(&self, codepoint: u32) -> bool {
        self.0.contains(&codepoint)
    }

    /// The number of codepoints in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the codepoints in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    /// The codepoints in `self` or `other`.
    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).copied().collect())
    }

    /// The codepoints in both `self` and `other`.
    pub fn intersection(&self, other: &Self) -> Self {
        // Walk the smaller set, the coverage of a big font can be huge
        // compared to a handful of requested codepoints.
        let (small, big) =
            if self.len() <= other.len() { (self, other) } else { (other, self) };
        Self(small.0.iter().copied().filter(|c| big.0.contains(c)).collect())
    }

    /// The codepoints in `self` but not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).copied().collect())
    }

    /// The codepoints in exactly one of `self` and `other`.
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        Self(self.0.symmetric_difference(&other.0).copied().collect())
    }

    /// Whether the two sets share at least one codepoint.
    pub fn intersects(&self, other: &Self) -> bool {
        let (small, big) =
            if self.len() <= other.len() { (self, other) } else { (other, self) };
        small.0.iter().any(|c| big.0.contains(c))
    }

    /// Whether every codepoint of `self` is in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Remove every codepoint of `other` from `self`.
    pub fn subtract(&mut self, other: &Self) {
        for c in other.iter() {
            self.0.remove(&c);
        }
    }
}

impl Debug for CodepointSet {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_set().entries(self.0.iter().map(|c| format!("U+{c:04X}"))).finish()
    }
}

impl FromIterator<u32> for CodepointSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<u32> for CodepointSet {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl<const N: usize> From<[u32; N]> for CodepointSet {
    fn from(codepoints: [u32; N]) -> Self {
        codepoints.into_iter().collect()
    }
}

impl IntoIterator for CodepointSet {
    type Item = u32;
    type IntoIter = std::collections::btree_set::IntoIter<u32>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a CodepointSet {
    type Item = u32;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, u32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_algebra() {
        let a = CodepointSet::from([65, 66, 67]);
        let b = CodepointSet::from([66, 67, 68]);

        assert_eq!(a.union(&b), CodepointSet::from([65, 66, 67, 68]));
        assert_eq!(a.intersection(&b), CodepointSet::from([66, 67]));
        assert_eq!(a.difference(&b), CodepointSet::from([65]));
        assert_eq!(a.symmetric_difference(&b), CodepointSet::from([65, 68]));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&CodepointSet::from([0x1F600])));
    }

    #[test]
    fn symmetric_difference_of_subset_is_difference() {
        let requested = CodepointSet::from_text("abcdef");
        let found = CodepointSet::from_text("bd");
        assert!(found.is_subset(&requested));
        assert_eq!(
            requested.symmetric_difference(&found),
            requested.difference(&found)
        );
    }

    #[test]
    fn duplicate_inserts_are_idempotent() {
        let mut set = CodepointSet::new();
        assert!(set.insert(0x41));
        assert!(!set.insert(0x41));
        set.extend([0x41, 0x41]);
        assert_eq!(set.len(), 1);
    }
}
