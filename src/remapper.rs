use crate::model::GlyphId;
use std::collections::{BTreeMap, BTreeSet};

/// A remapper that allows to assign a new ordering to a subset of glyphs.
/// For example, let's say that we want to subset a font that only contains the
/// glyphs 4, 9 and 16. In this case, the remapper could yield a remapping
/// that assigns the following glyph IDs:
/// 0 -> 0 (The .notdef glyph will always be included)
/// 4 -> 1
/// 9 -> 2
/// 16 -> 3
/// This is necessary because a font needs to have a contiguous sequence of
/// glyph IDs that start from 0, so we cannot just reuse the old ones, but we
/// need to define a mapping.
#[derive(Debug, Clone)]
pub struct GlyphRemapper {
    /// Maps glyphs from their old id to their new id.
    forward: BTreeMap<GlyphId, GlyphId>,
    /// The "reverse" mapping: `backward[new] = old`.
    backward: Vec<GlyphId>,
}

impl GlyphRemapper {
    /// Create a new instance of a glyph remapper.
    pub fn new() -> Self {
        let mut remapper = Self { forward: BTreeMap::new(), backward: vec![] };
        // .notdef is always a part of a subset.
        remapper.remap(GlyphId::NOTDEF);
        remapper
    }

    /// Create a remapper from an existing set of glyphs. The method
    /// will ensure that the mapping is monotonically increasing.
    pub fn new_from_glyphs(glyphs: &[GlyphId]) -> Self {
        let mut map = Self::new();
        let sorted = BTreeSet::from_iter(glyphs);

        for glyph in sorted {
            map.remap(*glyph);
        }

        map
    }

    /// Get the number of gids that have been remapped.
    pub fn num_gids(&self) -> usize {
        self.backward.len()
    }

    /// Remap a glyph ID, or return the existing mapping if the
    /// glyph ID has already been remapped before.
    pub fn remap(&mut self, old: GlyphId) -> GlyphId {
        *self.forward.entry(old).or_insert_with(|| {
            // There are as many distinct new ids as old ones, so a new id
            // always fits.
            let new = GlyphId(self.backward.len() as u16);
            self.backward.push(old);
            new
        })
    }

    /// Get the mapping of a glyph ID, if it has been remapped before.
    pub fn get(&self, old: GlyphId) -> Option<GlyphId> {
        self.forward.get(&old).copied()
    }

    /// Return an iterator that yields the old glyphs, in ascending order that
    /// is defined by the remapping. For example, if we perform the following remappings:
    /// 3, 39, 8, 3, 10, 2
    /// Then the iterator will yield the following items in the order below. The order
    /// also implicitly defines the glyph IDs in the new mapping:
    /// 0 (0), 3 (1), 39 (2), 8 (3), 10 (4), 2 (5)
    pub fn remapped_gids(&self) -> impl Iterator<Item = GlyphId> + '_ {
        self.backward.iter().copied()
    }
}

impl Default for GlyphRemapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notdef_comes_first_and_order_is_monotonic() {
        let remapper = GlyphRemapper::new_from_glyphs(&[GlyphId(16), GlyphId(4), GlyphId(9)]);
        assert_eq!(remapper.num_gids(), 4);
        assert_eq!(remapper.get(GlyphId(4)), Some(GlyphId(1)));
        assert_eq!(remapper.get(GlyphId(16)), Some(GlyphId(3)));
        assert_eq!(remapper.get(GlyphId(5)), None);
        assert_eq!(
            remapper.remapped_gids().collect::<Vec<_>>(),
            [GlyphId(0), GlyphId(4), GlyphId(9), GlyphId(16)]
        );
    }

    #[test]
    fn remapping_twice_is_stable() {
        let mut remapper = GlyphRemapper::new();
        for gid in [3, 39, 8, 3, 10, 2] {
            remapper.remap(GlyphId(gid));
        }
        assert_eq!(remapper.get(GlyphId(3)), Some(GlyphId(1)));
        assert_eq!(remapper.get(GlyphId(2)), Some(GlyphId(5)));
    }
}
