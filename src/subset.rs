//! Reduction of a font face to the glyphs needed for a set of codepoints.

use crate::codec::{FontCodec, Options, Sfnt};
use crate::codepoints::CodepointSet;
use crate::model::{FontModel, GlyphId};
use crate::remapper::GlyphRemapper;
use crate::{Error, Result, Tag};
use std::collections::{BTreeMap, BTreeSet};

/// Produces minimal font faces for a set of codepoints.
///
/// The waterfall subsetter only talks to faces through this trait. A face
/// keeps the bytes it was loaded from, so that it can be passed on whole.
pub trait SubsetPrimitive {
    /// A loaded font face.
    type Face: AsRef<[u8]>;

    /// Load the face at `index` of a font file.
    fn load(&self, data: Vec<u8>, index: u32) -> Result<Self::Face>;

    /// All codepoints the face maps to a glyph.
    fn collect_coverage(&self, face: &Self::Face) -> CodepointSet;

    /// Write a face that contains exactly the glyphs needed for `codepoints`.
    ///
    /// Fails with [`Error::NoIntersectingGlyphs`] if the face maps none of
    /// them.
    fn subset(&self, face: &Self::Face, codepoints: &CodepointSet) -> Result<Vec<u8>>;
}

/// A face loaded by [`GlyphClosure`].
#[derive(Debug, Clone)]
pub struct SfntFace {
    data: Vec<u8>,
    index: u32,
    model: FontModel,
}

impl SfntFace {
    /// The index of the face in its file.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The parsed face.
    pub fn model(&self) -> &FontModel {
        &self.model
    }
}

impl AsRef<[u8]> for SfntFace {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Subsets TrueType faces by closing the requested glyphs over their
/// component references.
#[derive(Debug, Clone, Default)]
pub struct GlyphClosure {
    options: Options,
}

/// Tables without glyph ids, which stay valid after renumbering.
const KEPT_TABLES: [Tag; 5] = [Tag::NAME, Tag::CVT, Tag::FPGM, Tag::PREP, Tag::GASP];

impl GlyphClosure {
    /// A primitive that parses and writes faces with the given options.
    pub fn new(options: Options) -> Self {
        Self { options }
    }
}

impl SubsetPrimitive for GlyphClosure {
    type Face = SfntFace;

    fn load(&self, data: Vec<u8>, index: u32) -> Result<SfntFace> {
        let model = Sfnt.parse(&data, index, &self.options)?;
        Ok(SfntFace { data, index, model })
    }

    fn collect_coverage(&self, face: &SfntFace) -> CodepointSet {
        face.model.coverage()
    }

    fn subset(&self, face: &SfntFace, codepoints: &CodepointSet) -> Result<Vec<u8>> {
        let model = subset_model(&face.model, codepoints)?;
        log::debug!(
            "subset face {} to {} codepoints in {} glyphs",
            face.index,
            model.cmap.len(),
            model.glyphs.len()
        );
        Sfnt.serialize(&model, &self.options)
    }
}

/// Build a model that only has the glyphs needed for `codepoints`.
pub(crate) fn subset_model(model: &FontModel, codepoints: &CodepointSet) -> Result<FontModel> {
    let mapped = codepoints
        .iter()
        .filter_map(|c| Some((c, model.glyph_index(c)?)))
        .collect::<Vec<_>>();

    if mapped.is_empty() {
        return Err(Error::NoIntersectingGlyphs);
    }

    let requested = mapped.iter().map(|(_, gid)| *gid);
    let closure = glyph_closure(model, requested)?;
    let remapper = GlyphRemapper::new_from_glyphs(&closure.into_iter().collect::<Vec<_>>());

    let mut glyphs = Vec::with_capacity(remapper.num_gids());
    for old in remapper.remapped_gids() {
        let mut glyph = model.glyph(old).ok_or(Error::MissingGlyphInTable(old))?.clone();
        for reference in &mut glyph.references {
            reference.glyph = remapper
                .get(reference.glyph)
                .ok_or(Error::MissingGlyphInTable(reference.glyph))?;
        }
        glyphs.push(glyph);
    }

    let mut cmap = BTreeMap::new();
    for (c, old) in mapped {
        cmap.insert(c, remapper.get(old).ok_or(Error::MissingGlyphInTable(old))?);
    }

    let tables = model
        .tables
        .iter()
        .filter(|(tag, _)| KEPT_TABLES.contains(tag))
        .map(|(tag, data)| (*tag, data.clone()))
        .collect();

    Ok(FontModel {
        head: model.head.clone(),
        hhea: model.hhea.clone(),
        vhea: model.vhea.clone(),
        os2: model.os2.clone(),
        post: model.post.as_ref().map(|post| post.remapped(remapper.remapped_gids())),
        cmap,
        glyphs,
        maxp: model.maxp.clone(),
        tables,
    })
}

/// The requested glyphs, `.notdef` and everything they reference.
fn glyph_closure(
    model: &FontModel,
    requested: impl IntoIterator<Item = GlyphId>,
) -> Result<BTreeSet<GlyphId>> {
    let mut closure = BTreeSet::new();
    let mut stack = vec![GlyphId::NOTDEF];
    stack.extend(requested);

    while let Some(gid) = stack.pop() {
        if !closure.insert(gid) {
            continue;
        }

        let glyph = model.glyph(gid).ok_or(Error::MissingGlyphInTable(gid))?;
        stack.extend(glyph.references.iter().map(|r| r.glyph));
    }

    Ok(closure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentReference, Glyph, Point};

    fn model() -> FontModel {
        let mut model = FontModel::new(1000);
        let bar = vec![vec![Point::on(0, 0), Point::on(0, 500), Point::on(100, 500)]];
        model.glyphs = vec![
            Glyph::empty(500),
            Glyph::simple(500, bar),
            Glyph::empty(250),
            Glyph::composite(500, vec![ComponentReference::new(GlyphId(1), 50, 0)]),
        ];
        model.cmap.insert(0x20, GlyphId(2));
        model.cmap.insert(0x69, GlyphId(3));
        model
    }

    #[test]
    fn closure_pulls_in_components() {
        let subset = subset_model(&model(), &CodepointSet::from([0x69])).unwrap();
        assert_eq!(subset.glyphs.len(), 3);
        assert_eq!(subset.cmap.get(&0x69), Some(&GlyphId(2)));
        assert_eq!(subset.glyphs[2].references[0].glyph, GlyphId(1));
        assert_eq!(subset.glyphs[2].references[0].x, 50);
    }

    #[test]
    fn unmapped_codepoints_are_no_intersection() {
        let result = subset_model(&model(), &CodepointSet::from([0x41, 0x42]));
        assert_eq!(result.unwrap_err(), Error::NoIntersectingGlyphs);
    }
}
