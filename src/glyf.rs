//! The `glyf` and `loca` tables hold the outlines. Reading decodes every
//! glyph description into contours or component references. Writing has to
//! do a bit more work:
//! 1. Bounding boxes are recomputed, for composite glyphs through the
//!    transforms of their components.
//! 2. The `maxp` statistics are collected on the way.
//! 3. The glyph descriptions are encoded and the `loca` format is picked
//!    based on the final size.

use crate::maxp::GlyphProfile;
use crate::model::{ComponentReference, ComponentScale, Contour, Glyph, GlyphId, Point};
use crate::stream::{F2Dot14, Reader, Writer};
use crate::{Error, Result};

/// Composite glyphs nested deeper than this are rejected.
const MAX_COMPONENT_DEPTH: usize = 64;

const ON_CURVE_POINT: u8 = 0x01;
const X_SHORT_VECTOR: u8 = 0x02;
const Y_SHORT_VECTOR: u8 = 0x04;
const REPEAT_FLAG: u8 = 0x08;
const X_IS_SAME_OR_POSITIVE: u8 = 0x10;
const Y_IS_SAME_OR_POSITIVE: u8 = 0x20;

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const ARGS_ARE_XY_VALUES: u16 = 0x0002;
const ROUND_XY_TO_GRID: u16 = 0x0004;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;
const WE_HAVE_INSTRUCTIONS: u16 = 0x0100;
const USE_MY_METRICS: u16 = 0x0200;
const OVERLAP_COMPOUND: u16 = 0x0400;

/// Decode the outlines of all glyphs into `glyphs`.
pub(crate) fn parse(
    glyf: &[u8],
    loca: &[u8],
    long_loca: bool,
    glyphs: &mut [Glyph],
    ignore_hints: bool,
) -> Result<()> {
    let offsets = read_loca(loca, long_loca, glyphs.len())?;

    for (i, glyph) in glyphs.iter_mut().enumerate() {
        let start = offsets[i];
        let end = offsets[i + 1];

        // Empty glyphs, like the space, have no description at all.
        if start >= end {
            continue;
        }

        let data = glyf.get(start..end).ok_or(Error::InvalidOffset)?;
        let mut r = Reader::new(data);
        let num_contours = r.read::<i16>().ok_or(Error::MissingData)?;
        r.skip(8).ok_or(Error::MissingData)?; // bbox, recomputed when writing

        if num_contours >= 0 {
            parse_simple(&mut r, num_contours as u16, glyph).ok_or(Error::MissingData)?;
        } else {
            parse_composite(&mut r, glyph)?;
        }

        if ignore_hints {
            glyph.instructions = vec![];
        }
    }

    Ok(())
}

fn read_loca(loca: &[u8], long_loca: bool, num_glyphs: usize) -> Result<Vec<usize>> {
    let mut r = Reader::new(loca);
    let offsets = if long_loca {
        r.read_vector::<u32>(num_glyphs + 1)
            .map(|v| v.into_iter().map(|o| o as usize).collect::<Vec<_>>())
    } else {
        r.read_vector::<u16>(num_glyphs + 1)
            .map(|v| v.into_iter().map(|o| 2 * usize::from(o)).collect::<Vec<_>>())
    };

    offsets.ok_or(Error::MissingData)
}

fn parse_simple(r: &mut Reader, num_contours: u16, glyph: &mut Glyph) -> Option<()> {
    let end_points = r.read_vector::<u16>(usize::from(num_contours))?;
    let num_points = end_points.last().map_or(0, |last| usize::from(*last) + 1);

    let instruction_len = r.read::<u16>()?;
    glyph.instructions = r.read_bytes(usize::from(instruction_len))?.to_vec();

    let mut flags = Vec::with_capacity(num_points);
    while flags.len() < num_points {
        let flag = r.read::<u8>()?;
        flags.push(flag);

        if flag & REPEAT_FLAG != 0 {
            let count = r.read::<u8>()?;
            for _ in 0..count {
                flags.push(flag);
            }
        }
    }
    flags.truncate(num_points);

    let read_coords = |r: &mut Reader, short: u8, same_or_positive: u8| -> Option<Vec<i32>> {
        let mut value = 0i32;
        let mut coords = Vec::with_capacity(num_points);
        for flag in &flags {
            let delta = if flag & short != 0 {
                let magnitude = i32::from(r.read::<u8>()?);
                if flag & same_or_positive != 0 {
                    magnitude
                } else {
                    -magnitude
                }
            } else if flag & same_or_positive != 0 {
                0
            } else {
                i32::from(r.read::<i16>()?)
            };

            value += delta;
            coords.push(value);
        }
        Some(coords)
    };

    let xs = read_coords(r, X_SHORT_VECTOR, X_IS_SAME_OR_POSITIVE)?;
    let ys = read_coords(r, Y_SHORT_VECTOR, Y_IS_SAME_OR_POSITIVE)?;

    let mut points = flags.iter().zip(xs).zip(ys).map(|((flag, x), y)| Point {
        x,
        y,
        on_curve: flag & ON_CURVE_POINT != 0,
    });

    let mut contours = Vec::with_capacity(end_points.len());
    let mut last_end = 0;
    for end in end_points {
        let end = usize::from(end) + 1;
        // End points must be increasing.
        let count = end.checked_sub(last_end)?;
        last_end = end;
        contours.push(points.by_ref().take(count).collect::<Contour>());
    }

    glyph.contours = contours;
    Some(())
}

fn parse_composite(r: &mut Reader, glyph: &mut Glyph) -> Result<()> {
    let mut has_instructions = false;

    loop {
        let flags = r.read::<u16>().ok_or(Error::MissingData)?;
        let gid = r.read::<u16>().ok_or(Error::MissingData)?;

        if flags & ARGS_ARE_XY_VALUES == 0 {
            // Components aligned by matching point numbers.
            return Err(Error::Unimplemented);
        }

        let (x, y) = if flags & ARG_1_AND_2_ARE_WORDS != 0 {
            let x = r.read::<i16>().ok_or(Error::MissingData)?;
            let y = r.read::<i16>().ok_or(Error::MissingData)?;
            (i32::from(x), i32::from(y))
        } else {
            let x = r.read::<i8>().ok_or(Error::MissingData)?;
            let y = r.read::<i8>().ok_or(Error::MissingData)?;
            (i32::from(x), i32::from(y))
        };

        let mut f2dot14 = || r.read::<F2Dot14>().map(F2Dot14::to_f32).ok_or(Error::MissingData);
        let scale = if flags & WE_HAVE_A_SCALE != 0 {
            ComponentScale::Uniform(f2dot14()?)
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            ComponentScale::XY(f2dot14()?, f2dot14()?)
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            ComponentScale::Matrix([f2dot14()?, f2dot14()?, f2dot14()?, f2dot14()?])
        } else {
            ComponentScale::None
        };

        glyph.references.push(ComponentReference {
            glyph: GlyphId(gid),
            x,
            y,
            scale,
            use_my_metrics: flags & USE_MY_METRICS != 0,
            round_xy_to_grid: flags & ROUND_XY_TO_GRID != 0,
            overlap: flags & OVERLAP_COMPOUND != 0,
        });

        has_instructions |= flags & WE_HAVE_INSTRUCTIONS != 0;
        if flags & MORE_COMPONENTS == 0 {
            break;
        }
    }

    if has_instructions {
        let len = r.read::<u16>().ok_or(Error::MissingData)?;
        glyph.instructions = r.read_bytes(usize::from(len)).ok_or(Error::MissingData)?.to_vec();
    }

    Ok(())
}

/// An axis-aligned bounding box in font units.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct BBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BBox {
    pub fn from_points(points: impl IntoIterator<Item = (i32, i32)>) -> Option<Self> {
        let mut points = points.into_iter();
        let (x, y) = points.next()?;
        let mut bbox = BBox { x_min: x, y_min: y, x_max: x, y_max: y };
        for (x, y) in points {
            bbox.x_min = bbox.x_min.min(x);
            bbox.y_min = bbox.y_min.min(y);
            bbox.x_max = bbox.x_max.max(x);
            bbox.y_max = bbox.y_max.max(y);
        }
        Some(bbox)
    }

    pub fn union(self, other: Self) -> Self {
        BBox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// The box of the transformed corners of this box.
    pub fn transform(self, reference: &ComponentReference) -> Self {
        let corners = [
            (self.x_min, self.y_min),
            (self.x_min, self.y_max),
            (self.x_max, self.y_min),
            (self.x_max, self.y_max),
        ];

        let transformed = corners.map(|(x, y)| {
            let (x, y) = reference.scale.apply(x as f32, y as f32);
            (x.round() as i32 + reference.x, y.round() as i32 + reference.y)
        });

        // Four corners are never empty.
        let [first, rest @ ..] = transformed;
        rest.into_iter().fold(
            BBox { x_min: first.0, y_min: first.1, x_max: first.0, y_max: first.1 },
            |bbox, (x, y)| bbox.union(BBox { x_min: x, y_min: y, x_max: x, y_max: y }),
        )
    }

    fn to_i16(self) -> Result<[i16; 4]> {
        let convert = |v: i32| i16::try_from(v).map_err(|_| Error::OverflowError);
        Ok([
            convert(self.x_min)?,
            convert(self.y_min)?,
            convert(self.x_max)?,
            convert(self.y_max)?,
        ])
    }
}

/// What writing needs to know about every glyph up front.
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    /// The bounding box of each glyph, `None` for glyphs without ink.
    pub bboxes: Vec<Option<BBox>>,
    pub profile: GlyphProfile,
}

impl Layout {
    /// The bounding box over all glyphs.
    pub fn font_bbox(&self) -> Option<BBox> {
        self.bboxes.iter().flatten().copied().reduce(BBox::union)
    }
}

#[derive(Debug, Copy, Clone, Default)]
struct Summary {
    bbox: Option<BBox>,
    points: u32,
    contours: u32,
    depth: u16,
}

/// Compute bounding boxes and `maxp` statistics for all glyphs.
pub(crate) fn analyze(glyphs: &[Glyph]) -> Result<Layout> {
    let mut cache = vec![None; glyphs.len()];
    let mut profile = GlyphProfile::default();
    let saturate = |v: usize| u16::try_from(v).unwrap_or(u16::MAX);

    for (i, glyph) in glyphs.iter().enumerate() {
        let gid = GlyphId(u16::try_from(i).map_err(|_| Error::OverflowError)?);
        let summary = summarize(glyphs, gid, 0, &mut cache)?;

        profile.max_size_of_instructions =
            profile.max_size_of_instructions.max(saturate(glyph.instructions.len()));

        if glyph.is_composite() {
            let points = u16::try_from(summary.points).unwrap_or(u16::MAX);
            let contours = u16::try_from(summary.contours).unwrap_or(u16::MAX);
            profile.max_composite_points = profile.max_composite_points.max(points);
            profile.max_composite_contours = profile.max_composite_contours.max(contours);
            profile.max_component_elements =
                profile.max_component_elements.max(saturate(glyph.references.len()));
            profile.max_component_depth = profile.max_component_depth.max(summary.depth);
        } else {
            profile.max_points = profile.max_points.max(saturate(summary.points as usize));
            profile.max_contours = profile.max_contours.max(saturate(glyph.contours.len()));
        }
    }

    let bboxes = cache.into_iter().map(|s| s.and_then(|s: Summary| s.bbox)).collect();
    Ok(Layout { bboxes, profile })
}

fn summarize(
    glyphs: &[Glyph],
    gid: GlyphId,
    depth: usize,
    cache: &mut [Option<Summary>],
) -> Result<Summary> {
    if let Some(Some(summary)) = cache.get(gid.index()) {
        return Ok(*summary);
    }

    if depth > MAX_COMPONENT_DEPTH {
        return Err(Error::InvalidData);
    }

    let glyph = glyphs.get(gid.index()).ok_or(Error::MissingGlyphInTable(gid))?;
    glyph.check_structure(gid)?;

    let summary = if glyph.is_composite() {
        let mut summary = Summary { depth: 1, ..Summary::default() };
        for reference in &glyph.references {
            let child = summarize(glyphs, reference.glyph, depth + 1, cache)?;
            summary.points += child.points;
            summary.contours += child.contours;
            summary.depth = summary.depth.max(child.depth + 1);

            if let Some(bbox) = child.bbox {
                let bbox = bbox.transform(reference);
                summary.bbox = Some(summary.bbox.map_or(bbox, |b| b.union(bbox)));
            }
        }
        summary
    } else {
        Summary {
            bbox: BBox::from_points(glyph.points().map(|p| (p.x, p.y))),
            points: glyph.points().count() as u32,
            contours: glyph.contours.len() as u32,
            depth: 0,
        }
    };

    if let Some(slot) = cache.get_mut(gid.index()) {
        *slot = Some(summary);
    }

    Ok(summary)
}

/// The encoded `glyf` and `loca` tables.
pub(crate) struct Encoded {
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
    pub long_loca: bool,
}

/// Encode all glyphs. `layout` must come from [`analyze`] on the same glyphs.
pub(crate) fn write(glyphs: &[Glyph], layout: &Layout) -> Result<Encoded> {
    let mut entries = Vec::with_capacity(glyphs.len());
    let mut size = 0;

    for (glyph, bbox) in glyphs.iter().zip(&layout.bboxes) {
        let mut w = Writer::new();
        if glyph.is_composite() {
            write_composite(&mut w, glyph, *bbox)?;
        } else if let Some(bbox) = bbox {
            write_simple(&mut w, glyph, *bbox)?;
        }

        // Keep every description 2-byte aligned so the short format works.
        w.align(2);
        size += w.len();
        entries.push(w.finish());
    }

    let long_loca = size > 2 * (u16::MAX as usize);

    let mut sub_glyf = Writer::with_capacity(size);
    let mut sub_loca = Writer::new();

    let mut write_offset = |offset: usize| {
        if long_loca {
            sub_loca.write::<u32>(offset as u32);
        } else {
            sub_loca.write::<u16>((offset / 2) as u16);
        }
    };

    for entry in &entries {
        write_offset(sub_glyf.len());
        sub_glyf.extend(entry);
    }

    // Write the final offset.
    write_offset(sub_glyf.len());

    Ok(Encoded { glyf: sub_glyf.finish(), loca: sub_loca.finish(), long_loca })
}

fn write_simple(w: &mut Writer, glyph: &Glyph, bbox: BBox) -> Result<()> {
    let contours = glyph.contours.iter().filter(|c| !c.is_empty()).collect::<Vec<_>>();

    w.write::<i16>(i16::try_from(contours.len()).map_err(|_| Error::OverflowError)?);
    for v in bbox.to_i16()? {
        w.write::<i16>(v);
    }

    let mut end = 0usize;
    for contour in &contours {
        end += contour.len();
        w.write::<u16>(u16::try_from(end - 1).map_err(|_| Error::OverflowError)?);
    }

    write_instructions(w, &glyph.instructions)?;

    let mut flags = vec![];
    let mut xs = Writer::new();
    let mut ys = Writer::new();
    let (mut last_x, mut last_y) = (0, 0);

    for point in contours.iter().copied().flatten() {
        let mut flag = if point.on_curve { ON_CURVE_POINT } else { 0 };
        flag |= write_delta(&mut xs, point.x - last_x, X_SHORT_VECTOR, X_IS_SAME_OR_POSITIVE)?;
        flag |= write_delta(&mut ys, point.y - last_y, Y_SHORT_VECTOR, Y_IS_SAME_OR_POSITIVE)?;
        flags.push(flag);
        last_x = point.x;
        last_y = point.y;
    }

    let mut i = 0;
    while i < flags.len() {
        let flag = flags[i];
        let mut run = 1;
        while run <= usize::from(u8::MAX) && flags.get(i + run) == Some(&flag) {
            run += 1;
        }

        if run > 1 {
            w.write::<u8>(flag | REPEAT_FLAG);
            w.write::<u8>((run - 1) as u8);
        } else {
            w.write::<u8>(flag);
        }

        i += run;
    }

    w.extend(&xs.finish());
    w.extend(&ys.finish());
    Ok(())
}

/// Write one coordinate delta in its shortest form and return the flag bits.
fn write_delta(w: &mut Writer, delta: i32, short: u8, same_or_positive: u8) -> Result<u8> {
    Ok(match delta {
        0 => same_or_positive,
        -255..=-1 => {
            w.write::<u8>(delta.unsigned_abs() as u8);
            short
        }
        1..=255 => {
            w.write::<u8>(delta as u8);
            short | same_or_positive
        }
        _ => {
            w.write::<i16>(i16::try_from(delta).map_err(|_| Error::OverflowError)?);
            0
        }
    })
}

fn write_composite(w: &mut Writer, glyph: &Glyph, bbox: Option<BBox>) -> Result<()> {
    w.write::<i16>(-1);
    let bbox = bbox.map_or(Ok([0; 4]), BBox::to_i16)?;
    for v in bbox {
        w.write::<i16>(v);
    }

    let count = glyph.references.len();
    for (i, reference) in glyph.references.iter().enumerate() {
        let mut flags = ARGS_ARE_XY_VALUES;

        let bytes = i8::try_from(reference.x).is_ok() && i8::try_from(reference.y).is_ok();
        if !bytes {
            flags |= ARG_1_AND_2_ARE_WORDS;
        }

        flags |= match reference.scale {
            ComponentScale::None => 0,
            ComponentScale::Uniform(_) => WE_HAVE_A_SCALE,
            ComponentScale::XY(..) => WE_HAVE_AN_X_AND_Y_SCALE,
            ComponentScale::Matrix(_) => WE_HAVE_A_TWO_BY_TWO,
        };

        if i + 1 < count {
            flags |= MORE_COMPONENTS;
        } else if !glyph.instructions.is_empty() {
            flags |= WE_HAVE_INSTRUCTIONS;
        }

        if reference.round_xy_to_grid {
            flags |= ROUND_XY_TO_GRID;
        }
        if reference.use_my_metrics {
            flags |= USE_MY_METRICS;
        }
        if reference.overlap {
            flags |= OVERLAP_COMPOUND;
        }

        w.write::<u16>(flags);
        w.write::<u16>(reference.glyph.0);

        if bytes {
            w.write::<i8>(reference.x as i8);
            w.write::<i8>(reference.y as i8);
        } else {
            let convert = |v: i32| i16::try_from(v).map_err(|_| Error::OverflowError);
            w.write::<i16>(convert(reference.x)?);
            w.write::<i16>(convert(reference.y)?);
        }

        match reference.scale {
            ComponentScale::None => {}
            ComponentScale::Uniform(s) => w.write(to_f2dot14(s)?),
            ComponentScale::XY(sx, sy) => {
                w.write(to_f2dot14(sx)?);
                w.write(to_f2dot14(sy)?);
            }
            ComponentScale::Matrix(matrix) => {
                for v in matrix {
                    w.write(to_f2dot14(v)?);
                }
            }
        }
    }

    if !glyph.instructions.is_empty() {
        write_instructions(w, &glyph.instructions)?;
    }

    Ok(())
}

fn write_instructions(w: &mut Writer, instructions: &[u8]) -> Result<()> {
    w.write::<u16>(u16::try_from(instructions.len()).map_err(|_| Error::OverflowError)?);
    w.extend(instructions);
    Ok(())
}

fn to_f2dot14(v: f32) -> Result<F2Dot14> {
    let raw = (v * 16384.0).round();
    if !(f32::from(i16::MIN)..=f32::from(i16::MAX)).contains(&raw) {
        return Err(Error::OverflowError);
    }
    Ok(F2Dot14(raw as i16))
}
