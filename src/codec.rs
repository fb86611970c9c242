//! Conversion between font files and the [`FontModel`].

use crate::glyf::{self, BBox};
use crate::head::FontBounds;
use crate::hhea::MetricsSummary;
use crate::model::{is_typed, FontModel, Glyph};
use crate::{cmap, head, hhea, hmtx, maxp, os2, post};
use crate::{Error, FontKind, Result, Tag};
use std::fmt::{self, Display, Formatter};

/// Parses font files into a [`FontModel`] and writes them back.
pub trait FontCodec {
    /// Parse the face at `index` of a font file.
    fn parse(&self, data: &[u8], index: u32, options: &Options) -> Result<FontModel>;

    /// Write a model into a standalone font file.
    fn serialize(&self, model: &FontModel, options: &Options) -> Result<Vec<u8>>;
}

/// How codepoints are rendered in diagnostics.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum CodepointFormat {
    /// As a decimal number, e.g. `955`.
    #[default]
    Decimal,
    /// In the `U+03BB` notation.
    Hex,
}

impl CodepointFormat {
    /// Render a codepoint in this format.
    pub fn display(self, codepoint: u32) -> impl Display {
        struct Rendered(CodepointFormat, u32);

        impl Display for Rendered {
            fn fmt(&self, f: &mut Formatter) -> fmt::Result {
                match self.0 {
                    CodepointFormat::Decimal => write!(f, "{}", self.1),
                    CodepointFormat::Hex => write!(f, "U+{:04X}", self.1),
                }
            }
        }

        Rendered(self, codepoint)
    }
}

/// How monospacing positions the ink inside the new advance width.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Centering {
    /// Move the midpoint of the ink onto the midpoint of the new advance.
    #[default]
    InkMidpoint,
    /// Keep the ratio between the distances of the ink edges to the old
    /// advance midpoint. Wide glyphs end up slightly off center.
    Proportional,
}

/// Settings for parsing, writing and transforming fonts.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Options {
    /// How hard to try to shrink the written font.
    ///
    /// - `0`: every table is written in full.
    /// - `1`: repeated advances at the end of `hmtx`/`vmtx` are folded.
    /// - `2`: additionally, glyph names are dropped from `post`.
    pub optimization_level: u8,
    /// Drop glyph instructions and the hinting tables when parsing.
    pub ignore_hints: bool,
    /// How codepoints are rendered in log output.
    pub codepoint_format: CodepointFormat,
    /// The centering strategy of monospacing.
    pub centering: Centering,
}

impl Options {
    /// Set the optimization level.
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.optimization_level = level;
        self
    }

    /// Set whether hinting is dropped when parsing.
    pub fn with_ignore_hints(mut self, ignore: bool) -> Self {
        self.ignore_hints = ignore;
        self
    }

    /// Set how codepoints are rendered in log output.
    pub fn with_codepoint_format(mut self, format: CodepointFormat) -> Self {
        self.codepoint_format = format;
        self
    }

    /// Set the centering strategy of monospacing.
    pub fn with_centering(mut self, centering: Centering) -> Self {
        self.centering = centering;
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            optimization_level: 1,
            ignore_hints: true,
            codepoint_format: CodepointFormat::default(),
            centering: Centering::default(),
        }
    }
}

/// The SFNT container with TrueType outlines.
#[derive(Debug, Copy, Clone, Default)]
pub struct Sfnt;

const DSIG: Tag = Tag(*b"DSIG");
const CFF: Tag = Tag(*b"CFF ");
const CFF2: Tag = Tag(*b"CFF2");

impl FontCodec for Sfnt {
    fn parse(&self, data: &[u8], index: u32, options: &Options) -> Result<FontModel> {
        let face = crate::parse(data, index)?;
        if face.kind == FontKind::Cff || face.table(CFF).is_some() || face.table(CFF2).is_some() {
            return Err(Error::Unimplemented);
        }

        let head = head::parse(face.expect_table(Tag::HEAD)?)?;
        let maxp = maxp::parse(face.expect_table(Tag::MAXP)?)?;
        let hhea = hhea::parse(face.expect_table(Tag::HHEA)?)?;
        let num_glyphs = usize::from(maxp.num_glyphs);

        let mut glyphs = vec![Glyph::default(); num_glyphs];

        let metrics =
            hmtx::parse(face.expect_table(Tag::HMTX)?, hhea.num_long_metrics(), num_glyphs)?;
        for (glyph, (advance, _)) in glyphs.iter_mut().zip(metrics) {
            glyph.advance_width = advance;
        }

        let glyf = face.expect_table(Tag::GLYF)?;
        let loca = face.expect_table(Tag::LOCA)?;
        let long_loca = head.index_to_loc_format() == 1;
        glyf::parse(glyf, loca, long_loca, &mut glyphs, options.ignore_hints)?;

        let vhea = match (face.table(Tag::VHEA), face.table(Tag::VMTX)) {
            (Some(vhea), Some(vmtx)) => {
                let vhea = hhea::parse(vhea)?;
                let metrics = hmtx::parse(vmtx, vhea.num_long_metrics(), num_glyphs)?;
                let layout = glyf::analyze(&glyphs)?;
                for ((glyph, (advance, bearing)), bbox) in
                    glyphs.iter_mut().zip(metrics).zip(&layout.bboxes)
                {
                    let y_max = bbox.map_or(0, |b| b.y_max);
                    glyph.advance_height = Some(advance);
                    glyph.vertical_origin = Some(i32::from(bearing) + y_max);
                }
                Some(vhea)
            }
            (Some(_), None) => return Err(Error::MissingTable(Tag::VMTX)),
            _ => None,
        };

        let cmap = cmap::parse(face.expect_table(Tag::CMAP)?, num_glyphs)?;
        if log::log_enabled!(log::Level::Trace) {
            for (c, gid) in &cmap {
                log::trace!("{} -> glyph {}", options.codepoint_format.display(*c), gid.0);
            }
        }

        let os2 = face.table(Tag::OS2).map(os2::parse).transpose()?;
        let post = face.table(Tag::POST).map(post::parse).transpose()?;

        let mut tables = std::collections::BTreeMap::new();
        for tag in face.tags() {
            if is_typed(tag) {
                continue;
            }

            // A signature can't survive any change to the font.
            if tag == DSIG || (options.ignore_hints && Tag::HINTING.contains(&tag)) {
                log::debug!("dropping {tag} table");
                continue;
            }

            if let Some(data) = face.table(tag) {
                tables.insert(tag, data.to_vec());
            }
        }

        log::debug!(
            "parsed face {index} with {num_glyphs} glyphs and {} mapped codepoints",
            cmap.len()
        );

        Ok(FontModel {
            head: Some(head),
            hhea: Some(hhea),
            vhea,
            os2,
            post,
            cmap,
            glyphs,
            maxp: Some(maxp),
            tables,
        })
    }

    fn serialize(&self, model: &FontModel, options: &Options) -> Result<Vec<u8>> {
        let head = model.head.as_ref().ok_or(Error::MissingRequiredField("head"))?;
        let hhea = model.hhea.as_ref().ok_or(Error::MissingRequiredField("hhea"))?;
        if model.glyphs.is_empty() {
            return Err(Error::MissingRequiredField(".notdef"));
        }

        let num_glyphs = u16::try_from(model.glyphs.len()).map_err(|_| Error::OverflowError)?;
        let layout = glyf::analyze(&model.glyphs)?;
        let encoded = glyf::write(&model.glyphs, &layout)?;

        let font_bounds = match layout.font_bbox() {
            Some(bbox) => FontBounds {
                x_min: to_i16(bbox.x_min)?,
                y_min: to_i16(bbox.y_min)?,
                x_max: to_i16(bbox.x_max)?,
                y_max: to_i16(bbox.y_max)?,
            },
            None => FontBounds::default(),
        };

        let trim = options.optimization_level >= 1;
        let mut tables = vec![
            (Tag::HEAD, head::write(head, font_bounds, encoded.long_loca)),
            (Tag::GLYF, encoded.glyf),
            (Tag::LOCA, encoded.loca),
            (Tag::MAXP, maxp::write(model.maxp.as_ref(), num_glyphs, &layout.profile)),
        ];

        // Horizontal metrics.
        let advances = model.glyphs.iter().map(|g| g.advance_width).collect::<Vec<_>>();
        let spans = layout.bboxes.iter().map(|b| b.map(|b| (b.x_min, b.x_max)));
        let (bearings, mut summary) = summarize(&advances, spans)?;
        let (hmtx, num_long_metrics) = hmtx::write(&advances, &bearings, trim);
        summary.num_long_metrics = num_long_metrics;
        tables.push((Tag::HMTX, hmtx));
        tables.push((Tag::HHEA, hhea::write(hhea, summary)));

        // Vertical metrics, measured downwards from the vertical origin.
        if let Some(vhea) = &model.vhea {
            let advances = model
                .glyphs
                .iter()
                .map(|g| g.advance_height.unwrap_or(head.units_per_em))
                .collect::<Vec<_>>();
            let spans = model.glyphs.iter().zip(&layout.bboxes).map(|(glyph, bbox)| {
                let origin = glyph.vertical_origin.unwrap_or(i32::from(vhea.ascender));
                bbox.map(|b: BBox| (origin - b.y_max, origin - b.y_min))
            });
            let (bearings, mut summary) = summarize(&advances, spans)?;
            let (vmtx, num_long_metrics) = hmtx::write(&advances, &bearings, trim);
            summary.num_long_metrics = num_long_metrics;
            tables.push((Tag::VMTX, vmtx));
            tables.push((Tag::VHEA, hhea::write(vhea, summary)));
        }

        if let Some((c, gid)) = model.cmap.iter().find(|(_, gid)| gid.index() >= model.glyphs.len())
        {
            log::debug!("{} maps to missing glyph", options.codepoint_format.display(*c));
            return Err(Error::MissingGlyphInTable(*gid));
        }
        tables.push((Tag::CMAP, cmap::write(&model.cmap)?));

        if let Some(os2) = &model.os2 {
            let first = model.cmap.keys().next().copied();
            let last = model.cmap.keys().next_back().copied();
            tables.push((Tag::OS2, os2::write(os2, first.zip(last))));
        }

        if let Some(post) = &model.post {
            let keep_names = options.optimization_level < 2;
            tables.push((Tag::POST, post::write(post, num_glyphs, keep_names)?));
        }

        for (tag, data) in &model.tables {
            tables.push((*tag, data.clone()));
        }

        crate::construct(FontKind::TrueType, tables)
    }
}

fn to_i16(v: i32) -> Result<i16> {
    i16::try_from(v).map_err(|_| Error::OverflowError)
}

/// Compute side bearings and header fields from advances and ink spans.
///
/// A span is the ink extent along the advance direction, measured from the
/// glyph origin. Glyphs without ink have a zero bearing and don't take part
/// in the minima.
fn summarize(
    advances: &[u16],
    spans: impl Iterator<Item = Option<(i32, i32)>>,
) -> Result<(Vec<i16>, MetricsSummary)> {
    let mut bearings = Vec::with_capacity(advances.len());
    let mut summary = MetricsSummary {
        advance_max: advances.iter().copied().max().unwrap_or(0),
        ..MetricsSummary::default()
    };

    let mut min_leading = None::<i32>;
    let mut min_trailing = None::<i32>;
    let mut max_extent = None::<i32>;

    for (advance, span) in advances.iter().zip(spans) {
        let Some((start, end)) = span else {
            bearings.push(0);
            continue;
        };

        bearings.push(to_i16(start)?);
        let trailing = i32::from(*advance) - end;
        min_leading = Some(min_leading.map_or(start, |v| v.min(start)));
        min_trailing = Some(min_trailing.map_or(trailing, |v| v.min(trailing)));
        max_extent = Some(max_extent.map_or(end, |v| v.max(end)));
    }

    summary.min_leading_bearing = to_i16(min_leading.unwrap_or(0))?;
    summary.min_trailing_bearing = to_i16(min_trailing.unwrap_or(0))?;
    summary.max_extent = to_i16(max_extent.unwrap_or(0))?;

    Ok((bearings, summary))
}
