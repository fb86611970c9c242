use crate::stream::{Readable, Reader, Writeable, Writer};
use crate::{Error, Result};
use std::borrow::Cow;

/// A Format 4 subtable.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Subtable4<'a> {
    language: u16,
    seg_count: u16,
    end_codes: Vec<u16>,
    start_codes: Vec<u16>,
    id_deltas: Vec<i16>,
    id_range_offsets: Vec<u16>,
    glyph_id_array: Cow<'a, [u8]>,
}

impl<'a> Subtable4<'a> {
    /// Returns a glyph index for a code point.
    pub fn glyph_index(&self, code_point: u32) -> Option<u16> {
        // This subtable supports code points only in a u16 range.
        let code_point = u16::try_from(code_point).ok()?;

        // A custom binary search.
        let mut start = 0;
        let mut end = self.start_codes.len();
        while end > start {
            let index = (start + end) / 2;
            let end_value = *self.end_codes.get(index)?;
            if end_value >= code_point {
                let start_value = *self.start_codes.get(index)?;
                if start_value > code_point {
                    end = index;
                } else {
                    let id_range_offset = *self.id_range_offsets.get(index)?;
                    let id_delta = *self.id_deltas.get(index)?;
                    if id_range_offset == 0 {
                        return Some(code_point.wrapping_add(id_delta as u16));
                    } else if id_range_offset == 0xFFFF {
                        // Some malformed fonts have 0xFFFF as the last offset,
                        // which is invalid and should be ignored.
                        return None;
                    }

                    let delta = (u32::from(code_point) - u32::from(start_value)) * 2;
                    let delta = u16::try_from(delta).ok()?;

                    let id_range_offset_pos = (index * 2) as u16;
                    let pos = id_range_offset_pos.wrapping_add(delta);
                    let pos = pos.wrapping_add(id_range_offset);

                    let glyph_array_value =
                        u16::read_at(self.glyph_id_array.as_ref(), usize::from(pos))?;

                    // 0 indicates missing glyph.
                    if glyph_array_value == 0 {
                        return None;
                    }

                    let glyph_id = (glyph_array_value as i16).wrapping_add(id_delta);
                    return u16::try_from(glyph_id).ok();
                }
            } else {
                start = index + 1;
            }
        }

        None
    }

    /// Calls `f` for each codepoint defined in this table.
    pub fn codepoints(&self, mut f: impl FnMut(u32)) {
        for (start, end) in self.start_codes.iter().zip(&self.end_codes) {
            // OxFFFF value is special and indicates codes end.
            if *start == *end && *start == 0xFFFF {
                break;
            }

            for code_point in *start..=*end {
                f(u32::from(code_point));
            }
        }
    }

    pub fn read(data: &'a [u8]) -> Result<Self> {
        let mut r = Reader::new(data);
        r.skip(4).ok_or(Error::MissingData)?; // format + length
        let language = r.read::<u16>().ok_or(Error::MissingData)?;
        let seg_count_x2 = r.read::<u16>().ok_or(Error::MissingData)?;

        if seg_count_x2 < 2 {
            return Err(Error::InvalidData);
        }

        let seg_count = seg_count_x2 / 2;
        r.skip(6).ok_or(Error::MissingData)?; // search range + entry selector + range shift
        let end_codes = r.read_vector::<u16>(seg_count as usize).ok_or(Error::MissingData)?;
        r.skip(2).ok_or(Error::MissingData)?; // reserved pad
        let start_codes = r.read_vector::<u16>(seg_count as usize).ok_or(Error::MissingData)?;
        let id_deltas = r.read_vector::<i16>(seg_count as usize).ok_or(Error::MissingData)?;

        let glyph_id_array = Cow::Borrowed(r.tail().ok_or(Error::MissingData)?);
        let id_range_offsets =
            r.read_vector::<u16>(seg_count as usize).ok_or(Error::MissingData)?;

        Ok(Subtable4 {
            language,
            seg_count,
            end_codes,
            start_codes,
            id_deltas,
            id_range_offsets,
            glyph_id_array,
        })
    }

    /// Build a subtable from `(codepoint, glyph)` pairs sorted by codepoint.
    ///
    /// Runs of consecutive codepoints with a constant delta become one
    /// segment, so no glyph id array is needed.
    pub fn from_mappings(mappings: &[(u16, u16)]) -> Result<Subtable4<'static>> {
        let delta = |pair: (u16, u16)| (pair.1 as i32 - pair.0 as i32) as i16;

        let mut segments = vec![];
        let mut map_iter = mappings.iter().copied();

        if let Some(first) = map_iter.next() {
            let mut cur_start = first.0;
            let mut cur_delta = delta(first);
            let mut cur_range = 0;

            for next in map_iter {
                if u32::from(next.0) == u32::from(cur_start) + cur_range + 1
                    && delta(next) == cur_delta
                {
                    cur_range += 1;
                    continue;
                }

                segments.push((cur_start, cur_start + cur_range as u16, cur_delta));
                cur_start = next.0;
                cur_delta = delta(next);
                cur_range = 0;
            }

            // Don't forget the last range!
            segments.push((cur_start, cur_start + cur_range as u16, cur_delta));
        }

        // "For the search to terminate, the final start code and endCode values must
        // be 0xFFFF. This segment need not contain any valid mappings. (It can just map the
        // single character code 0xFFFF to missingGlyph). However, the segment must be present."
        // The caller keeps U+FFFF itself out of the mappings.
        segments.push((0xFFFF, 0xFFFF, 1));

        let seg_count = u16::try_from(segments.len()).map_err(|_| Error::OverflowError)?;
        if 16 + 8 * usize::from(seg_count) > usize::from(u16::MAX) {
            return Err(Error::OverflowError);
        }

        Ok(Subtable4 {
            language: 0,
            seg_count,
            end_codes: segments.iter().map(|e| e.1).collect(),
            start_codes: segments.iter().map(|e| e.0).collect(),
            id_deltas: segments.iter().map(|e| e.2).collect(),
            id_range_offsets: vec![0; usize::from(seg_count)],
            glyph_id_array: Cow::Owned(vec![]),
        })
    }
}

impl Writeable for Subtable4<'_> {
    fn write(&self, w: &mut Writer) {
        w.write::<u16>(4); // format

        // (format + length + language + seg_count_x2 + search_range +
        // entry_selector + range_shift + reserved_pad) + seg_count *
        // (end_code + start_code + id_delta + id_range_offsets)
        let length = 2 * 8 + 2 * self.seg_count * 4;
        w.write::<u16>(length);
        w.write::<u16>(self.language);

        let seg_count_x2 = 2 * self.seg_count;
        let floor_log_2 = (u16::BITS - self.seg_count.leading_zeros()) - 1;
        let search_range = 2 * 2u16.pow(floor_log_2);
        let entry_selector = floor_log_2 as u16;
        let range_shift = seg_count_x2 - search_range;

        w.write::<u16>(seg_count_x2);
        w.write::<u16>(search_range);
        w.write::<u16>(entry_selector);
        w.write::<u16>(range_shift);

        w.write(self.end_codes.as_slice());
        w.write::<u16>(0); // reserved pad
        w.write(self.start_codes.as_slice());
        w.write(self.id_deltas.as_slice());
        w.write(self.id_range_offsets.as_slice());
    }
}
