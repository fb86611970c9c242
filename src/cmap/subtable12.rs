use crate::stream::{Readable, Reader, Writeable, Writer};
use crate::{Error, Result};

#[derive(Debug, Copy, Clone)]
struct SequentialMapGroupRecord {
    start_char_code: u32,
    end_char_code: u32,
    start_glyph_id: u32,
}

impl Readable<'_> for SequentialMapGroupRecord {
    const SIZE: usize = 12;

    fn read(r: &mut Reader<'_>) -> Option<Self> {
        let start_char_code = r.read::<u32>()?;
        let end_char_code = r.read::<u32>()?;
        let start_glyph_id = r.read::<u32>()?;

        Some(Self { start_char_code, end_char_code, start_glyph_id })
    }
}

impl Writeable for SequentialMapGroupRecord {
    fn write(&self, w: &mut Writer) {
        w.write::<u32>(self.start_char_code);
        w.write::<u32>(self.end_char_code);
        w.write::<u32>(self.start_glyph_id);
    }
}

/// A format 12 subtable.
pub(crate) struct Subtable12 {
    language: u32,
    groups: Vec<SequentialMapGroupRecord>,
}

impl Subtable12 {
    /// Returns a glyph index for a code point.
    pub fn glyph_index(&self, code_point: u32) -> Option<u16> {
        let index = self
            .groups
            .binary_search_by(|range| {
                use core::cmp::Ordering;

                if range.start_char_code > code_point {
                    Ordering::Greater
                } else if range.end_char_code < code_point {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .ok()?;

        let group = &self.groups[index];

        let id = group
            .start_glyph_id
            .checked_add(code_point)?
            .checked_sub(group.start_char_code)?;
        u16::try_from(id).ok()
    }

    /// Calls `f` for each codepoint defined in this table.
    pub fn codepoints(&self, mut f: impl FnMut(u32)) {
        for group in &self.groups {
            // Cap absurd ranges of corrupted fonts at the Unicode maximum.
            for code_point in group.start_char_code..=group.end_char_code.min(0x10FFFF) {
                f(code_point);
            }
        }
    }

    pub fn read(data: &[u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        r.skip(8).ok_or(Error::MissingData)?; // format + reserved + length
        let language = r.read::<u32>().ok_or(Error::MissingData)?;
        let num_groups = r.read::<u32>().ok_or(Error::MissingData)?;

        let groups = r
            .read_vector::<SequentialMapGroupRecord>(num_groups as usize)
            .ok_or(Error::MissingData)?;
        Ok(Self { language, groups })
    }

    /// Build a subtable from `(codepoint, glyph)` pairs sorted by codepoint.
    pub fn from_mappings(mappings: &[(u32, u16)]) -> Self {
        let mut map_iter = mappings.iter().copied();
        let mut groups = vec![];

        if let Some(first) = map_iter.next() {
            let mut cur_start = first.0;
            let mut cur_gid = first.1;
            let mut cur_range = 0;

            for next in map_iter {
                if next.0 == cur_start + cur_range + 1
                    && next.1 as u32 == cur_gid as u32 + cur_range + 1
                {
                    cur_range += 1;
                    continue;
                }

                groups.push(SequentialMapGroupRecord {
                    start_char_code: cur_start,
                    end_char_code: cur_start + cur_range,
                    start_glyph_id: cur_gid as u32,
                });

                cur_start = next.0;
                cur_gid = next.1;
                cur_range = 0;
            }

            groups.push(SequentialMapGroupRecord {
                start_char_code: cur_start,
                end_char_code: cur_start + cur_range,
                start_glyph_id: cur_gid as u32,
            });
        }

        Self { language: 0, groups }
    }
}

impl Writeable for Subtable12 {
    fn write(&self, w: &mut Writer) {
        // format + reserved + length + language + num_groups + num_groups * (start_char,
        // end_char, start_glyph_id)
        let length = 2 + 2 + 4 + 4 + 4 + (4 + 4 + 4) * self.groups.len();

        w.write::<u16>(12);
        w.write::<u16>(0);
        w.write::<u32>(length as u32);
        w.write::<u32>(self.language);
        w.write::<u32>(self.groups.len() as u32);
        w.write(self.groups.as_slice());
    }
}
