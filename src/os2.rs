use crate::stream::Readable;
use crate::{Error, Result};

/// The OS/2 and Windows metrics table.
///
/// Only the fields that the transforms adjust are exposed. Tables from very
/// old fonts that end before the typographic metrics keep those fields at
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Os2 {
    /// The average advance width.
    pub x_avg_char_width: i16,
    /// The typographic ascender.
    pub typo_ascender: Option<i16>,
    /// The typographic descender.
    pub typo_descender: Option<i16>,
    /// The typographic line gap.
    pub typo_line_gap: Option<i16>,
    /// The clipping ascent on Windows.
    pub win_ascent: Option<u16>,
    /// The clipping descent on Windows.
    pub win_descent: Option<u16>,
    data: Vec<u8>,
}

impl Os2 {
    /// A fresh version 4 table with the given line metrics.
    pub fn new(ascender: i16, descender: i16, line_gap: i16) -> Self {
        let mut data = vec![0; 96];
        data[0..2].copy_from_slice(&4u16.to_be_bytes()); // version
        data[4..6].copy_from_slice(&400u16.to_be_bytes()); // weight class
        data[6..8].copy_from_slice(&5u16.to_be_bytes()); // width class
        data[62..64].copy_from_slice(&0x0040u16.to_be_bytes()); // fsSelection: regular

        Self {
            x_avg_char_width: 0,
            typo_ascender: Some(ascender),
            typo_descender: Some(descender),
            typo_line_gap: Some(line_gap),
            win_ascent: Some(ascender.max(0) as u16),
            win_descent: Some(descender.unsigned_abs()),
            data,
        }
    }
}

pub(crate) fn parse(data: &[u8]) -> Result<Os2> {
    Ok(Os2 {
        x_avg_char_width: i16::read_at(data, 2).ok_or(Error::MissingData)?,
        typo_ascender: i16::read_at(data, 68),
        typo_descender: i16::read_at(data, 70),
        typo_line_gap: i16::read_at(data, 72),
        win_ascent: u16::read_at(data, 74),
        win_descent: u16::read_at(data, 76),
        data: data.to_vec(),
    })
}

/// Write the table. `char_range` is the smallest and largest mapped
/// codepoint.
pub(crate) fn write(os2: &Os2, char_range: Option<(u32, u32)>) -> Vec<u8> {
    let mut data = os2.data.clone();

    let mut patch = |offset: usize, bytes: [u8; 2]| {
        if let Some(slot) = data.get_mut(offset..offset + 2) {
            slot.copy_from_slice(&bytes);
        }
    };

    patch(2, os2.x_avg_char_width.to_be_bytes());

    // Both char indices are 16-bit and saturate for supplementary planes.
    let (first, last) = char_range.unwrap_or((0, 0));
    patch(64, (first.min(0xFFFF) as u16).to_be_bytes());
    patch(66, (last.min(0xFFFF) as u16).to_be_bytes());

    if let Some(v) = os2.typo_ascender {
        patch(68, v.to_be_bytes());
    }
    if let Some(v) = os2.typo_descender {
        patch(70, v.to_be_bytes());
    }
    if let Some(v) = os2.typo_line_gap {
        patch(72, v.to_be_bytes());
    }
    if let Some(v) = os2.win_ascent {
        patch(74, v.to_be_bytes());
    }
    if let Some(v) = os2.win_descent {
        patch(76, v.to_be_bytes());
    }

    data
}
