//! The `head` table mostly contains information that can be reused from the
//! old table. The bounding box and the `loca` format depend on the glyph data
//! and are patched in when writing, the checksum is recalculated in the very
//! end.

use crate::stream::Readable;
use crate::{Error, Result};

const MAGIC_NUMBER: u32 = 0x5F0F3CF5;

/// The font header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    /// The size of the design grid.
    pub units_per_em: u16,
    data: Vec<u8>,
}

impl Head {
    /// A fresh header for a font with the given units per em.
    pub fn new(units_per_em: u16) -> Self {
        let mut data = vec![0; 54];
        data[0..4].copy_from_slice(&0x00010000u32.to_be_bytes()); // version
        data[4..8].copy_from_slice(&0x00010000u32.to_be_bytes()); // font revision
        data[12..16].copy_from_slice(&MAGIC_NUMBER.to_be_bytes());
        data[16..18].copy_from_slice(&0b11u16.to_be_bytes()); // flags: y=0 baseline, x=0 lsb
        data[46..48].copy_from_slice(&8u16.to_be_bytes()); // lowest rec ppem
        data[48..50].copy_from_slice(&2i16.to_be_bytes()); // font direction hint
        Self { units_per_em, data }
    }

    /// The `indexToLocFormat` the font was read with.
    pub(crate) fn index_to_loc_format(&self) -> i16 {
        i16::read_at(&self.data, 50).unwrap_or(0)
    }
}

pub(crate) fn parse(data: &[u8]) -> Result<Head> {
    if data.len() < 54 {
        return Err(Error::MissingData);
    }

    if u32::read_at(data, 12) != Some(MAGIC_NUMBER) {
        return Err(Error::InvalidData);
    }

    let units_per_em = u16::read_at(data, 18).ok_or(Error::MissingData)?;
    let head = Head { units_per_em, data: data[..54].to_vec() };

    if !matches!(head.index_to_loc_format(), 0 | 1) {
        return Err(Error::UnexpectedValueType("indexToLocFormat"));
    }

    Ok(head)
}

/// The bounding box over all glyphs.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub(crate) struct FontBounds {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

pub(crate) fn write(head: &Head, bounds: FontBounds, long_loca: bool) -> Vec<u8> {
    let mut data = head.data.clone();
    data[18..20].copy_from_slice(&head.units_per_em.to_be_bytes());
    data[36..38].copy_from_slice(&bounds.x_min.to_be_bytes());
    data[38..40].copy_from_slice(&bounds.y_min.to_be_bytes());
    data[40..42].copy_from_slice(&bounds.x_max.to_be_bytes());
    data[42..44].copy_from_slice(&bounds.y_max.to_be_bytes());
    data[50..52].copy_from_slice(&(long_loca as i16).to_be_bytes());
    data
}
