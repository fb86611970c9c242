//! The `post` table contains name information for glyphs needed for some
//! PostScript printers. Only a version 2 table contains actual custom names,
//! every other version is reduced to its 32 byte header.

use crate::model::GlyphId;
use crate::stream::{Reader, Writer};
use crate::{Error, Result};

/// PostScript information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Whether the font is monospaced.
    pub is_fixed_pitch: bool,
    header: Vec<u8>,
    names: Option<Vec<GlyphName>>,
}

/// The name of one glyph in a version 2 table.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GlyphName {
    /// An index into the standard Macintosh glyph order.
    Standard(u16),
    /// A name stored in the table itself.
    Custom(Vec<u8>),
}

impl Post {
    /// A version 3 table without glyph names.
    pub fn new() -> Self {
        let mut header = vec![0; 32];
        header[0..4].copy_from_slice(&0x00030000u32.to_be_bytes());
        Self { is_fixed_pitch: false, header, names: None }
    }

    /// The custom name of a glyph. Standard Macintosh names are not resolved.
    pub(crate) fn custom_name(&self, gid: GlyphId) -> Option<&str> {
        match self.names.as_ref()?.get(gid.index())? {
            GlyphName::Custom(name) => std::str::from_utf8(name).ok(),
            GlyphName::Standard(_) => None,
        }
    }

    /// Reorder the names for a new glyph order, where `order[new] = old`.
    pub(crate) fn remapped(&self, order: impl Iterator<Item = GlyphId>) -> Self {
        let names = self.names.as_ref().map(|names| {
            order
                .map(|old| {
                    names
                        .get(old.index())
                        .cloned()
                        .unwrap_or(GlyphName::Custom(vec![]))
                })
                .collect()
        });

        Self { is_fixed_pitch: self.is_fixed_pitch, header: self.header.clone(), names }
    }
}

impl Default for Post {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse(data: &[u8]) -> Result<Post> {
    // Do not check the exact length, because some fonts include
    // padding in table's length in table records, which is incorrect.
    let header = data.get(..32).ok_or(Error::MissingData)?;
    let mut r = Reader::new(header);
    let version = r.read::<u32>().ok_or(Error::MissingData)?;
    r.skip(8).ok_or(Error::MissingData)?; // italic angle, underline position + thickness
    let is_fixed_pitch = r.read::<u32>().ok_or(Error::MissingData)? != 0;

    let names = if version == 0x00020000 { parse_names(data) } else { None };

    Ok(Post { is_fixed_pitch, header: header.to_vec(), names })
}

/// Parse the glyph names of a version 2 table. A broken name list is
/// dropped instead of failing the whole font.
fn parse_names(data: &[u8]) -> Option<Vec<GlyphName>> {
    let mut r = Reader::new_at(data, 32);
    let count = r.read::<u16>()?;
    let indexes = r.read_vector::<u16>(usize::from(count))?;
    let storage = Names { data: r.tail()?, offset: 0 }.collect::<Vec<_>>();

    Some(
        indexes
            .into_iter()
            .map(|index| {
                // IDs smaller than 258 refer to the names in the Macintosh TrueType file.
                if index <= 257 {
                    GlyphName::Standard(index)
                } else {
                    // Some fonts have a wrong name table. If a name cannot be
                    // fetched, use an empty name instead.
                    let name = storage.get(usize::from(index - 258)).copied().unwrap_or(&[]);
                    GlyphName::Custom(name.to_vec())
                }
            })
            .collect(),
    )
}

/// Write the table. Names are only kept if there is one for every glyph.
pub(crate) fn write(post: &Post, num_glyphs: u16, keep_names: bool) -> Result<Vec<u8>> {
    let names = post
        .names
        .as_ref()
        .filter(|names| keep_names && names.len() == usize::from(num_glyphs));

    let mut header = post.header.clone();
    header[12..16].copy_from_slice(&u32::from(post.is_fixed_pitch).to_be_bytes());

    let Some(names) = names else {
        header[0..4].copy_from_slice(&0x00030000u32.to_be_bytes());
        return Ok(header);
    };

    header[0..4].copy_from_slice(&0x00020000u32.to_be_bytes());

    let mut sub_post = Writer::new();
    sub_post.extend(&header);
    sub_post.write::<u16>(num_glyphs);

    let mut string_storage = Writer::new();
    let mut string_index = 0;

    for name in names {
        match name {
            GlyphName::Standard(index) => sub_post.write::<u16>(*index),
            GlyphName::Custom(name) => {
                let name_len = u8::try_from(name.len()).map_err(|_| Error::OverflowError)?;
                let index =
                    u16::try_from(string_index + 258).map_err(|_| Error::OverflowError)?;
                sub_post.write::<u16>(index);

                string_storage.write::<u8>(name_len);
                string_storage.extend(name);
                string_index += 1;
            }
        }
    }

    sub_post.extend(&string_storage.finish());
    Ok(sub_post.finish())
}

/// An iterator over glyph names.
///
/// The `post` table doesn't provide the glyph names count,
/// so we have to simply iterate over all of them to find it out.
#[derive(Clone, Copy, Default)]
struct Names<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for Names<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let len = *self.data.get(self.offset)?;
        self.offset += 1;

        let name = self.data.get(self.offset..self.offset + usize::from(len))?;
        self.offset += usize::from(len);
        Some(name)
    }
}
