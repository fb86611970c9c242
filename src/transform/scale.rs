use crate::model::FontModel;
use crate::{Error, Result};

/// The range of units per em OpenType allows.
const UNITS_PER_EM_RANGE: std::ops::RangeInclusive<u32> = 16..=16384;

pub(crate) fn change_units_per_em(model: &mut FontModel, units_per_em: u32) -> Result<()> {
    if !UNITS_PER_EM_RANGE.contains(&units_per_em) {
        return Err(Error::UnitsPerEmOutOfRange(units_per_em));
    }

    let old = model.units_per_em()?;
    if model.hhea.is_none() {
        return Err(Error::MissingRequiredField("hhea"));
    }

    if old == 0 {
        return Err(Error::UnexpectedValueType("unitsPerEm"));
    }

    let factor = f64::from(units_per_em) / f64::from(old);
    let scaler = Scaler(factor);
    log::debug!("scaling from {old} to {units_per_em} units per em (factor {factor})");

    for glyph in &mut model.glyphs {
        glyph.advance_width = scaler.u16(glyph.advance_width)?;
        if let Some(height) = &mut glyph.advance_height {
            *height = scaler.u16(*height)?;
        }
        if let Some(origin) = &mut glyph.vertical_origin {
            *origin = scaler.i32(*origin);
        }

        for point in glyph.contours.iter_mut().flatten() {
            point.x = scaler.i32(point.x);
            point.y = scaler.i32(point.y);
        }

        for reference in &mut glyph.references {
            reference.x = scaler.i32(reference.x);
            reference.y = scaler.i32(reference.y);
        }
    }

    for header in model.hhea.iter_mut().chain(model.vhea.as_mut()) {
        header.ascender = scaler.i16(header.ascender)?;
        header.descender = scaler.i16(header.descender)?;
        header.line_gap = scaler.i16(header.line_gap)?;
    }

    if let Some(os2) = &mut model.os2 {
        os2.x_avg_char_width = scaler.i16(os2.x_avg_char_width)?;
        for value in [&mut os2.typo_ascender, &mut os2.typo_descender, &mut os2.typo_line_gap]
            .into_iter()
            .flatten()
        {
            *value = scaler.i16(*value)?;
        }
        for value in [&mut os2.win_ascent, &mut os2.win_descent].into_iter().flatten() {
            *value = scaler.u16(*value)?;
        }
    }

    if let Some(head) = &mut model.head {
        // Checked against the range above.
        head.units_per_em = units_per_em as u16;
    }

    Ok(())
}

/// Multiplies font units by a factor and rounds to the nearest unit.
#[derive(Debug, Copy, Clone)]
struct Scaler(f64);

impl Scaler {
    fn scale(self, v: f64) -> f64 {
        (v * self.0).round()
    }

    fn i32(self, v: i32) -> i32 {
        // Saturates for absurd coordinates, which then fail to serialize.
        self.scale(f64::from(v)) as i32
    }

    fn i16(self, v: i16) -> Result<i16> {
        let scaled = self.scale(f64::from(v));
        i16::try_from(scaled as i64).map_err(|_| Error::OverflowError)
    }

    fn u16(self, v: u16) -> Result<u16> {
        let scaled = self.scale(f64::from(v));
        u16::try_from(scaled as i64).map_err(|_| Error::OverflowError)
    }
}
