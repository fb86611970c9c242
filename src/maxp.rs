use crate::stream::{Reader, Writer};
use crate::{Error, Result};

/// The parts of `maxp` that can't be derived from the glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Maxp {
    pub num_glyphs: u16,
    /// maxZones through maxStackElements, the limits of the hinting
    /// interpreter. Only present in version 1.0.
    interpreter: Option<[u8; 12]>,
}

pub(crate) fn parse(data: &[u8]) -> Result<Maxp> {
    let mut r = Reader::new(data);
    let version = r.read::<u32>().ok_or(Error::MissingData)?;
    let num_glyphs = r.read::<u16>().ok_or(Error::MissingData)?;

    let interpreter = if version == 0x00010000 {
        r.skip(8).ok_or(Error::MissingData)?; // points + contours, simple and composite
        Some(r.read::<[u8; 12]>().ok_or(Error::MissingData)?)
    } else {
        None
    };

    Ok(Maxp { num_glyphs, interpreter })
}

/// Glyph statistics collected while writing `glyf`.
#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct GlyphProfile {
    pub max_points: u16,
    pub max_contours: u16,
    pub max_composite_points: u16,
    pub max_composite_contours: u16,
    pub max_size_of_instructions: u16,
    pub max_component_elements: u16,
    pub max_component_depth: u16,
}

/// Write a version 1.0 table. TrueType outlines always need that version.
pub(crate) fn write(maxp: Option<&Maxp>, num_glyphs: u16, profile: &GlyphProfile) -> Vec<u8> {
    let mut w = Writer::with_capacity(32);
    w.write::<u32>(0x00010000);
    w.write::<u16>(num_glyphs);
    w.write::<u16>(profile.max_points);
    w.write::<u16>(profile.max_contours);
    w.write::<u16>(profile.max_composite_points);
    w.write::<u16>(profile.max_composite_contours);

    match maxp.and_then(|m| m.interpreter) {
        Some(interpreter) => w.write(interpreter),
        None => {
            w.write::<u16>(2); // maxZones
            w.write::<[u8; 10]>([0; 10]);
        }
    }

    w.write::<u16>(profile.max_size_of_instructions);
    w.write::<u16>(profile.max_component_elements);
    w.write::<u16>(profile.max_component_depth);
    w.finish()
}
