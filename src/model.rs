//! The in-memory representation of one font face.
//!
//! Tables that the metric transforms touch are parsed into typed structs;
//! everything else is carried along as raw bytes and written back unchanged.

use crate::codepoints::CodepointSet;
use crate::head::Head;
use crate::hhea::MetricsHeader;
use crate::maxp::Maxp;
use crate::os2::Os2;
use crate::post::Post;
use crate::{Error, Result, Tag};
use std::collections::BTreeMap;

/// The index of a glyph in the font.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct GlyphId(pub u16);

impl GlyphId {
    /// The `.notdef` glyph.
    pub const NOTDEF: Self = Self(0);

    pub(crate) fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// A point of a glyph outline.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Point {
    /// The horizontal position in font units.
    pub x: i32,
    /// The vertical position in font units.
    pub y: i32,
    /// Whether the point lies on the curve or is a quadratic control point.
    pub on_curve: bool,
}

impl Point {
    /// An on-curve point.
    pub fn on(x: i32, y: i32) -> Self {
        Self { x, y, on_curve: true }
    }

    /// An off-curve control point.
    pub fn off(x: i32, y: i32) -> Self {
        Self { x, y, on_curve: false }
    }
}

/// A closed contour of a simple glyph.
pub type Contour = Vec<Point>;

/// The linear part of a component transform.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum ComponentScale {
    /// No scaling.
    #[default]
    None,
    /// The same scale in both directions.
    Uniform(f32),
    /// Independent horizontal and vertical scales.
    XY(f32, f32),
    /// A full 2x2 matrix `[xx, xy, yx, yy]`.
    Matrix([f32; 4]),
}

impl ComponentScale {
    /// Apply the linear transform to a point.
    pub fn apply(self, x: f32, y: f32) -> (f32, f32) {
        match self {
            Self::None => (x, y),
            Self::Uniform(s) => (x * s, y * s),
            Self::XY(sx, sy) => (x * sx, y * sy),
            Self::Matrix([xx, xy, yx, yy]) => (x * xx + y * yx, x * xy + y * yy),
        }
    }
}

/// A positioned instance of another glyph inside a composite glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentReference {
    /// The referenced glyph.
    pub glyph: GlyphId,
    /// Horizontal offset of the component.
    pub x: i32,
    /// Vertical offset of the component.
    pub y: i32,
    /// The linear part of the transform.
    pub scale: ComponentScale,
    /// Use the advance width and side bearing of this component for the
    /// composite glyph.
    pub use_my_metrics: bool,
    /// Round the offset to the pixel grid when hinting.
    pub round_xy_to_grid: bool,
    /// The components of the composite glyph overlap.
    pub overlap: bool,
}

impl ComponentReference {
    /// A reference to `glyph` placed at `(x, y)`.
    pub fn new(glyph: GlyphId, x: i32, y: i32) -> Self {
        Self {
            glyph,
            x,
            y,
            scale: ComponentScale::None,
            use_my_metrics: false,
            round_xy_to_grid: false,
            overlap: false,
        }
    }
}

/// One glyph with its metrics.
///
/// A glyph is either simple (`contours`) or composite (`references`). A
/// glyph with neither, like the space, has no ink. Having both is a
/// corrupted glyph and rejected by every operation that looks at it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
    /// The horizontal advance.
    pub advance_width: u16,
    /// The vertical advance, if the font has vertical metrics.
    pub advance_height: Option<u16>,
    /// The y coordinate of the vertical origin, if the font has vertical
    /// metrics.
    pub vertical_origin: Option<i32>,
    /// The outline of a simple glyph.
    pub contours: Vec<Contour>,
    /// The components of a composite glyph.
    pub references: Vec<ComponentReference>,
    /// TrueType hinting instructions.
    pub instructions: Vec<u8>,
}

impl Glyph {
    /// A simple glyph.
    pub fn simple(advance_width: u16, contours: Vec<Contour>) -> Self {
        Self { advance_width, contours, ..Self::default() }
    }

    /// A composite glyph.
    pub fn composite(advance_width: u16, references: Vec<ComponentReference>) -> Self {
        Self { advance_width, references, ..Self::default() }
    }

    /// A glyph without any outline.
    pub fn empty(advance_width: u16) -> Self {
        Self { advance_width, ..Self::default() }
    }

    /// Whether this glyph is made of references to other glyphs.
    pub fn is_composite(&self) -> bool {
        !self.references.is_empty()
    }

    /// The points of all contours.
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.contours.iter().flatten()
    }

    /// The smallest and largest x coordinate of the outline. `None` for
    /// composite glyphs and glyphs without points.
    pub fn x_extent(&self) -> Option<(i32, i32)> {
        self.points().fold(None, |acc, p| match acc {
            None => Some((p.x, p.x)),
            Some((min, max)) => Some((min.min(p.x), max.max(p.x))),
        })
    }

    /// Fail if the glyph has both contours and references.
    pub(crate) fn check_structure(&self, gid: GlyphId) -> Result<()> {
        if !self.contours.is_empty() && !self.references.is_empty() {
            return Err(Error::GlyphHasBothContoursAndReferences(gid));
        }

        Ok(())
    }
}

/// The tables of one font face.
#[derive(Debug, Clone, PartialEq)]
pub struct FontModel {
    /// The font header.
    pub head: Option<Head>,
    /// The horizontal header.
    pub hhea: Option<MetricsHeader>,
    /// The vertical header. Vertical metrics are only written if present.
    pub vhea: Option<MetricsHeader>,
    /// OS/2 and Windows metrics.
    pub os2: Option<Os2>,
    /// PostScript information.
    pub post: Option<Post>,
    /// The mapping from Unicode codepoints to glyphs.
    pub cmap: BTreeMap<u32, GlyphId>,
    /// All glyphs, indexed by glyph id.
    pub glyphs: Vec<Glyph>,
    pub(crate) maxp: Option<Maxp>,
    pub(crate) tables: BTreeMap<Tag, Vec<u8>>,
}

impl FontModel {
    /// Create a font without glyphs on a grid with the given units per em.
    ///
    /// Ascender and descender default to 80% and 20% of the em.
    pub fn new(units_per_em: u16) -> Self {
        let ascender = (i32::from(units_per_em) * 4 / 5) as i16;
        let descender = -((i32::from(units_per_em) / 5) as i16);

        Self {
            head: Some(Head::new(units_per_em)),
            hhea: Some(MetricsHeader::new(ascender, descender, 0)),
            vhea: None,
            os2: Some(Os2::new(ascender, descender, 0)),
            post: Some(Post::new()),
            cmap: BTreeMap::new(),
            glyphs: vec![],
            maxp: None,
            tables: BTreeMap::new(),
        }
    }

    /// The units per em of the font.
    pub fn units_per_em(&self) -> Result<u16> {
        Ok(self.head.as_ref().ok_or(Error::MissingRequiredField("head"))?.units_per_em)
    }

    /// The number of glyphs.
    pub fn num_glyphs(&self) -> usize {
        self.glyphs.len()
    }

    /// Look up a glyph.
    pub fn glyph(&self, gid: GlyphId) -> Option<&Glyph> {
        self.glyphs.get(gid.index())
    }

    /// Look up a glyph mutably.
    pub fn glyph_mut(&mut self, gid: GlyphId) -> Option<&mut Glyph> {
        self.glyphs.get_mut(gid.index())
    }

    /// Append a glyph and return its id.
    pub fn push_glyph(&mut self, glyph: Glyph) -> Result<GlyphId> {
        let gid = u16::try_from(self.glyphs.len()).map_err(|_| Error::OverflowError)?;
        self.glyphs.push(glyph);
        Ok(GlyphId(gid))
    }

    /// The glyph a codepoint maps to.
    pub fn glyph_index(&self, codepoint: u32) -> Option<GlyphId> {
        self.cmap.get(&codepoint).copied()
    }

    /// All codepoints the font maps to a glyph.
    pub fn coverage(&self) -> CodepointSet {
        self.cmap.keys().copied().collect()
    }

    /// The custom PostScript name of a glyph, if the font has one.
    pub fn glyph_name(&self, gid: GlyphId) -> Option<&str> {
        self.post.as_ref()?.custom_name(gid)
    }

    /// Raw data of a table the model doesn't interpret.
    pub fn table(&self, tag: Tag) -> Option<&[u8]> {
        self.tables.get(&tag).map(Vec::as_slice)
    }

    /// Add or replace a table the model doesn't interpret.
    ///
    /// Tags of typed tables are rejected, they are written from the model.
    pub fn set_table(&mut self, tag: Tag, data: Vec<u8>) -> Result<()> {
        if is_typed(tag) {
            return Err(Error::UnexpectedValueType("table tag"));
        }

        self.tables.insert(tag, data);
        Ok(())
    }

    /// Tags of the tables the model doesn't interpret.
    pub fn raw_tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tables.keys().copied()
    }

    /// Remove a table. Returns whether it was present.
    ///
    /// Tables every TrueType font needs can't be removed.
    pub fn remove_table(&mut self, tag: Tag) -> Result<bool> {
        Ok(match tag {
            Tag::HEAD | Tag::HHEA | Tag::HMTX | Tag::MAXP | Tag::CMAP | Tag::GLYF
            | Tag::LOCA => return Err(Error::MissingRequiredField("mandatory table")),
            Tag::OS2 => self.os2.take().is_some(),
            Tag::POST => self.post.take().is_some(),
            Tag::VHEA | Tag::VMTX => {
                for glyph in &mut self.glyphs {
                    glyph.advance_height = None;
                    glyph.vertical_origin = None;
                }
                self.vhea.take().is_some()
            }
            _ => self.tables.remove(&tag).is_some(),
        })
    }
}

/// Whether a table is parsed into the model instead of being carried as raw
/// bytes.
pub(crate) fn is_typed(tag: Tag) -> bool {
    matches!(
        tag,
        Tag::HEAD
            | Tag::HHEA
            | Tag::HMTX
            | Tag::MAXP
            | Tag::CMAP
            | Tag::GLYF
            | Tag::LOCA
            | Tag::OS2
            | Tag::POST
            | Tag::VHEA
            | Tag::VMTX
    )
}
