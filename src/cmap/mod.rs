//! Reading and writing of the character to glyph mapping.
//!
//! The model keeps a flat codepoint → glyph map. When reading, the best
//! Unicode subtable is picked; when writing, a format 4 subtable covers the
//! BMP and a format 12 subtable is added if anything lies beyond it.

use crate::cmap::subtable12::Subtable12;
use crate::cmap::subtable4::Subtable4;
use crate::model::GlyphId;
use crate::stream::{Readable, Reader, Writeable, Writer};
use crate::{Error, Result};
use std::collections::BTreeMap;

mod subtable12;
mod subtable4;

#[derive(Debug, Copy, Clone)]
struct EncodingRecord {
    platform_id: u16,
    encoding_id: u16,
    subtable_offset: u32,
}

impl EncodingRecord {
    /// Windows symbol subtables (3, 0) don't map Unicode, they reuse the
    /// private use area for font-specific codes.
    fn is_unicode(&self) -> bool {
        self.platform_id == 0 || (self.platform_id == 3 && [1, 10].contains(&self.encoding_id))
    }
}

impl Readable<'_> for EncodingRecord {
    const SIZE: usize = 8;

    fn read(r: &mut Reader) -> Option<Self> {
        let platform_id = r.read::<u16>()?;
        let encoding_id = r.read::<u16>()?;
        let subtable_offset = r.read::<u32>()?;

        Some(EncodingRecord { platform_id, encoding_id, subtable_offset })
    }
}

impl Writeable for EncodingRecord {
    fn write(&self, w: &mut Writer) {
        w.write::<u16>(self.platform_id);
        w.write::<u16>(self.encoding_id);
        w.write::<u32>(self.subtable_offset);
    }
}

pub(crate) fn parse(data: &[u8], num_glyphs: usize) -> Result<BTreeMap<u32, GlyphId>> {
    let mut r = Reader::new(data);
    r.read::<u16>().ok_or(Error::MissingData)?; // version
    let num_tables = r.read::<u16>().ok_or(Error::MissingData)?;
    let records = r
        .read_vector::<EncodingRecord>(usize::from(num_tables))
        .ok_or(Error::MissingData)?;

    // Full-repertoire format 12 subtables win over BMP-only format 4 ones.
    let mut best: Option<(u16, &[u8])> = None;
    for record in records.iter().filter(|r| r.is_unicode()) {
        let subtable = data.get(record.subtable_offset as usize..).ok_or(Error::InvalidOffset)?;
        let format = u16::read_at(subtable, 0).ok_or(Error::MissingData)?;
        let rank = match format {
            12 => 2,
            4 => 1,
            _ => continue,
        };

        if best.map_or(true, |(prev, _)| rank > prev) {
            best = Some((rank, subtable));
        }
    }

    let mut mappings = vec![];
    match best {
        Some((2, subtable)) => {
            let table = Subtable12::read(subtable)?;
            table.codepoints(|c| {
                if let Some(g) = table.glyph_index(c) {
                    mappings.push((c, g));
                }
            });
        }
        Some((_, subtable)) => {
            let table = Subtable4::read(subtable)?;
            table.codepoints(|c| {
                if let Some(g) = table.glyph_index(c) {
                    mappings.push((c, g));
                }
            });
        }
        None => {
            if num_tables != 0 {
                log::warn!("cmap has no unicode subtable, font maps no codepoints");
            }
        }
    }

    let mut map = BTreeMap::new();
    for (c, g) in mappings {
        if g == 0 {
            continue;
        }

        if usize::from(g) >= num_glyphs {
            log::warn!("cmap maps U+{c:04X} to nonexistent glyph {g}, dropping it");
            continue;
        }

        map.insert(c, GlyphId(g));
    }

    Ok(map)
}

pub(crate) fn write(map: &BTreeMap<u32, GlyphId>) -> Result<Vec<u8>> {
    let bmp = map
        .iter()
        .filter(|(c, _)| **c < 0xFFFF)
        .map(|(c, g)| (*c as u16, g.0))
        .collect::<Vec<_>>();

    let mut subtables = vec![];

    let mut w = Writer::new();
    w.write(Subtable4::from_mappings(&bmp)?);
    subtables.push(w.finish());

    let full = map.keys().next_back().is_some_and(|c| *c > 0xFFFF);
    if full {
        let all = map.iter().map(|(c, g)| (*c, g.0)).collect::<Vec<_>>();
        let mut w = Writer::new();
        w.write(Subtable12::from_mappings(&all));
        subtables.push(w.finish());
    }

    // Records have to be sorted by platform and encoding. Each subtable is
    // referenced from a Unicode platform and a Windows platform record.
    let mut records = vec![(0, 3, 0), (3, 1, 0)];
    if full {
        records = vec![(0, 3, 0), (0, 4, 1), (3, 1, 0), (3, 10, 1)];
    }

    let header_len = 4 + 8 * records.len();
    let mut offsets = vec![header_len as u32];
    for subtable in &subtables {
        let last = *offsets.last().unwrap_or(&0);
        offsets.push(last + subtable.len() as u32);
    }

    let mut sub_cmap = Writer::new();
    sub_cmap.write::<u16>(0);
    sub_cmap.write::<u16>(records.len() as u16);

    for (platform_id, encoding_id, subtable) in records {
        sub_cmap.write(EncodingRecord {
            platform_id,
            encoding_id,
            subtable_offset: offsets[subtable],
        });
    }

    for subtable in &subtables {
        sub_cmap.extend(subtable);
    }

    Ok(sub_cmap.finish())
}
