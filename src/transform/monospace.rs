//! Monospacing: one advance width for all glyphs, with the ink kept
//! centered.
//!
//! The shift of a glyph depends on its ink extent, and the ink extent of a
//! composite glyph depends on its components. Glyphs are therefore resolved
//! depth first, components before the glyphs using them, with an explicit
//! stack instead of recursion. Each glyph is resolved once.
//!
//! A component is shifted together with its own glyph. The composite then
//! only has to move the component offset by the difference between its own
//! shift and the shift the component already received.

use crate::codec::Centering;
use crate::glyf::BBox;
use crate::model::{ComponentScale, FontModel, Glyph, GlyphId};
use crate::{Error, Result};
use rustc_hash::{FxHashMap, FxHashSet};

/// The outcome of resolving one glyph.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Resolved {
    /// The ink box before shifting.
    ink: Option<BBox>,
    /// The horizontal shift of the glyph.
    move_by: i32,
}

#[derive(Debug, Copy, Clone)]
struct Frame {
    gid: GlyphId,
    next_component: usize,
}

pub(crate) fn make_monospaced(model: &mut FontModel, width: u16, centering: Centering) -> Result<()> {
    let resolved = resolve(&model.glyphs, width, centering)?;

    for (i, glyph) in model.glyphs.iter_mut().enumerate() {
        let gid = GlyphId(i as u16);
        let Some(own) = resolved.get(&gid) else { continue };

        for point in glyph.contours.iter_mut().flatten() {
            point.x += own.move_by;
        }

        for reference in &mut glyph.references {
            let child = resolved.get(&reference.glyph).map_or(0, |r| r.move_by);
            let (dx, dy) = scaled_shift(reference.scale, child);
            reference.x += own.move_by - dx;
            reference.y -= dy;
        }

        if glyph.advance_width != 0 {
            glyph.advance_width = width;
        }
    }

    if let Some(post) = &mut model.post {
        post.is_fixed_pitch = true;
    }

    if let Some(os2) = &mut model.os2 {
        // Saturates for advances beyond the signed field.
        os2.x_avg_char_width = i16::try_from(width).unwrap_or(i16::MAX);
    }

    log::debug!("made {} glyphs {width} units wide", model.glyphs.len());
    Ok(())
}

/// Resolve every glyph, components first.
fn resolve(
    glyphs: &[Glyph],
    width: u16,
    centering: Centering,
) -> Result<FxHashMap<GlyphId, Resolved>> {
    let count = u16::try_from(glyphs.len()).map_err(|_| Error::OverflowError)?;
    let mut memo = FxHashMap::default();
    let mut visiting = FxHashSet::default();

    for root in (0..count).map(GlyphId) {
        if memo.contains_key(&root) {
            continue;
        }

        let mut stack = vec![Frame { gid: root, next_component: 0 }];
        visiting.insert(root);

        while let Some(&Frame { gid, next_component }) = stack.last() {
            let glyph = glyphs.get(gid.index()).ok_or(Error::MissingGlyphInTable(gid))?;
            glyph.check_structure(gid)?;

            if let Some(reference) = glyph.references.get(next_component) {
                if let Some(top) = stack.last_mut() {
                    top.next_component += 1;
                }

                let child = reference.glyph;
                if memo.contains_key(&child) {
                    continue;
                }

                if child.index() >= glyphs.len() {
                    return Err(Error::MissingGlyphInTable(child));
                }

                if !visiting.insert(child) {
                    return Err(Error::CyclicReferenceFound(child));
                }

                stack.push(Frame { gid: child, next_component: 0 });
                continue;
            }

            // All components are resolved.
            stack.pop();
            visiting.remove(&gid);

            let ink = ink_extent(glyph, &memo);
            let shift = match ink {
                Some(bbox) if glyph.advance_width != 0 => {
                    move_by(centering, bbox.x_min, bbox.x_max, glyph.advance_width, width)
                }
                _ => 0,
            };

            log::trace!("glyph {} has ink {ink:?} and moves by {shift}", gid.0);
            memo.insert(gid, Resolved { ink, move_by: shift });
        }
    }

    Ok(memo)
}

/// The ink box of a glyph whose components are resolved.
fn ink_extent(glyph: &Glyph, memo: &FxHashMap<GlyphId, Resolved>) -> Option<BBox> {
    if !glyph.is_composite() {
        return BBox::from_points(glyph.points().map(|p| (p.x, p.y)));
    }

    glyph
        .references
        .iter()
        .filter_map(|reference| Some(memo.get(&reference.glyph)?.ink?.transform(reference)))
        .reduce(BBox::union)
}

/// How far `moveBy` has to shift a glyph with ink from `left` to `right` to
/// center it in the new advance `width`.
fn move_by(centering: Centering, left: i32, right: i32, advance: u16, width: u16) -> i32 {
    let (left, right) = (f64::from(left), f64::from(right));
    let half_width = f64::from(width) / 2.0;

    match centering {
        Centering::InkMidpoint => (half_width - (left + right) / 2.0).round() as i32,
        Centering::Proportional => {
            let mut ratio = (left - f64::from(advance) / 2.0)
                / (right - f64::from(advance | 1) / 2.0);
            if ratio == 1.0 {
                ratio += f64::EPSILON;
            }

            let left_new = left - half_width;
            let right_new = right - half_width;
            let shift = (right_new * ratio - left_new) / (1.0 - ratio);

            // The nudged ratio can still overflow for extreme bearings.
            if shift.is_finite() {
                shift.trunc() as i32
            } else {
                0
            }
        }
    }
}

/// The shift a component received, as seen from the composite.
fn scaled_shift(transform: ComponentScale, shift: i32) -> (i32, i32) {
    let (dx, dy) = transform.apply(shift as f32, 0.0);
    (dx.round() as i32, dy.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentReference, Point};

    fn bar(left: i32, right: i32) -> Vec<Vec<Point>> {
        vec![vec![Point::on(left, 0), Point::on(right, 0), Point::on(right, 700)]]
    }

    #[test]
    fn midpoint_centers_ink() {
        assert_eq!(move_by(Centering::InkMidpoint, -10, 590, 600, 1000), 210);
        assert_eq!(move_by(Centering::InkMidpoint, 0, 1000, 1000, 1000), 0);
    }

    #[test]
    fn proportional_matches_ratio_formula() {
        // Ink centered in an odd advance gives a ratio of exactly -1.
        assert_eq!(move_by(Centering::Proportional, 100, 501, 601, 1000), 199);
        // A vertical stroke gives a ratio of exactly 1.
        assert!(move_by(Centering::Proportional, 100, 100, 601, 1000).abs() <= 1000);
    }

    #[test]
    fn composite_compensates_component_shift() {
        let mut model = FontModel::new(1000);
        model.glyphs = vec![
            Glyph::empty(500),
            Glyph::simple(600, bar(100, 400)),
            Glyph::composite(800, vec![ComponentReference::new(GlyphId(1), 100, 0)]),
        ];

        make_monospaced(&mut model, 600, Centering::InkMidpoint).unwrap();

        // The simple glyph moves by 50.
        assert_eq!(model.glyphs[1].x_extent(), Some((150, 450)));
        // The composite ink spans 200..500 and moves by -50.
        assert_eq!(model.glyphs[2].references[0].x, 0);
        assert!(model.glyphs.iter().skip(1).all(|g| g.advance_width == 600));
    }

    #[test]
    fn child_shift_is_not_applied_twice() {
        let mut model = FontModel::new(1000);
        model.glyphs = vec![
            Glyph::empty(500),
            // Centered on 288, so it moves by 12 inside a 600 advance.
            Glyph::simple(576, bar(188, 388)),
            Glyph::composite(600, vec![ComponentReference::new(GlyphId(1), 0, 0)]),
        ];

        let resolved = resolve(&model.glyphs, 600, Centering::InkMidpoint).unwrap();
        assert_eq!(resolved[&GlyphId(1)].move_by, 12);
        assert_eq!(resolved[&GlyphId(2)].move_by, 12);

        make_monospaced(&mut model, 600, Centering::InkMidpoint).unwrap();
        assert_eq!(model.glyphs[2].references[0].x, 0);
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        // Glyph 1 references glyph 2, which references glyph 3, and so on.
        let mut glyphs = vec![Glyph::empty(0)];
        for i in 1..5000u16 {
            glyphs.push(Glyph::composite(500, vec![ComponentReference::new(GlyphId(i + 1), 0, 0)]));
        }
        glyphs.push(Glyph::simple(500, bar(0, 100)));

        let resolved = resolve(&glyphs, 500, Centering::InkMidpoint).unwrap();
        assert_eq!(resolved.len(), glyphs.len());
        assert_eq!(resolved[&GlyphId(1)].ink.map(|b| (b.x_min, b.x_max)), Some((0, 100)));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let glyphs = vec![
            Glyph::empty(500),
            Glyph::composite(500, vec![ComponentReference::new(GlyphId(1), 0, 0)]),
        ];

        assert_eq!(
            resolve(&glyphs, 600, Centering::InkMidpoint),
            Err(Error::CyclicReferenceFound(GlyphId(1)))
        );
    }

    #[test]
    fn skewed_component_is_centered() {
        let mut skewed = ComponentReference::new(GlyphId(1), 0, 0);
        skewed.scale = ComponentScale::Matrix([1.0, 0.0, 0.5, 1.0]);

        let mut model = FontModel::new(1000);
        model.glyphs = vec![
            Glyph::empty(0),
            Glyph::simple(600, bar(0, 100)),
            Glyph::composite(600, vec![skewed]),
        ];

        // The slanted bar spans 0..450 inside the composite.
        let resolved = resolve(&model.glyphs, 600, Centering::InkMidpoint).unwrap();
        assert_eq!(resolved[&GlyphId(2)].ink.map(|b| (b.x_min, b.x_max)), Some((0, 450)));
        assert_eq!(resolved[&GlyphId(2)].move_by, 75);

        make_monospaced(&mut model, 600, Centering::InkMidpoint).unwrap();
        assert_eq!(model.glyphs[2].references[0].x, -175);

        let after = resolve(&model.glyphs, 600, Centering::InkMidpoint).unwrap();
        assert_eq!(after[&GlyphId(2)].ink.map(|b| (b.x_min, b.x_max)), Some((75, 525)));
    }

    #[test]
    fn vertical_drift_of_component_is_undone() {
        let mut sheared = ComponentReference::new(GlyphId(1), 0, 0);
        sheared.scale = ComponentScale::Matrix([1.0, 0.5, 0.0, 1.0]);

        let mut model = FontModel::new(1000);
        model.glyphs = vec![
            Glyph::empty(0),
            Glyph::simple(600, bar(0, 100)),
            Glyph::composite(600, vec![sheared]),
        ];

        make_monospaced(&mut model, 600, Centering::InkMidpoint).unwrap();

        // The child moved by 250, which the shear turns into a rise of 125.
        let reference = &model.glyphs[2].references[0];
        assert_eq!((reference.x, reference.y), (0, -125));
    }

    #[test]
    fn average_width_saturates() {
        let mut model = FontModel::new(1000);
        model.glyphs = vec![Glyph::simple(500, bar(0, 100))];

        make_monospaced(&mut model, 40000, Centering::InkMidpoint).unwrap();
        assert_eq!(model.glyphs[0].advance_width, 40000);
        assert_eq!(model.os2.as_ref().map(|os2| os2.x_avg_char_width), Some(i16::MAX));
    }
}
