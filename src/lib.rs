/*!
Waterfall subsetting and glyph metric transforms for TrueType fonts.

The crate has two halves:

- [`WaterfallSubsetter`] takes a set of requested Unicode codepoints and a
  ranked list of font sources (primary, category backup, last resort) and
  produces one minimal face per source that contributed glyphs, until every
  codepoint is satisfied or all sources are exhausted.
- [`Modifier`] owns a parsed [`FontModel`] and rescales it to a new
  units-per-em grid, forces a uniform advance width with the ink kept
  centered (resolving composite glyphs with cycle detection), or strips
  TrueType hinting, before serializing it back into an OpenType file.

# Example
```no_run
use fontsmith::{Modifier, Options, WaterfallSubsetter};

# fn main() -> Result<(), Box<dyn std::error::Error>> {
let faces = WaterfallSubsetter::new()
    .add_primary(std::path::Path::new("fonts/Inter-Regular.ttf"), 0)
    .add_last_resort(std::path::Path::new("fonts/Iosevka-Regular.ttf"), 0)
    .add_text("Hello, λ!")
    .run()?;

let mut modifier = Modifier::new(&faces[0], 0, Options::default())?;
modifier.change_units_per_em(2048)?;
modifier.change_make_monospaced_by_em_ratio(0.6)?;
let ttf = modifier.export_result()?;
fontsmith::fs::write_bytes("target/Inter-Mono.ttf", &ttf)?;
# Ok(())
# }
```

Parsing and writing of the font binary is done by [`Sfnt`], which supports
TrueType outlines only. Tables the model doesn't understand are carried over
verbatim.
*/

#![deny(unsafe_code)]
#![deny(missing_docs)]

mod cmap;
mod codec;
mod codepoints;
pub mod fs;
mod glyf;
mod head;
mod hhea;
mod hmtx;
mod maxp;
mod model;
mod os2;
mod post;
mod remapper;
mod stream;
mod subset;
mod transform;
mod waterfall;
mod woff2;

pub use crate::codec::{Centering, CodepointFormat, FontCodec, Options, Sfnt};
pub use crate::codepoints::CodepointSet;
pub use crate::head::Head;
pub use crate::hhea::MetricsHeader;
pub use crate::model::{
    ComponentReference, ComponentScale, Contour, FontModel, Glyph, GlyphId, Point,
};
pub use crate::os2::Os2;
pub use crate::post::Post;
pub use crate::remapper::GlyphRemapper;
pub use crate::subset::{GlyphClosure, SfntFace, SubsetPrimitive};
pub use crate::transform::Modifier;
pub use crate::waterfall::{FontSource, WaterfallSubsetter};
#[cfg(feature = "woff2")]
pub use crate::woff2::Woff2;
pub use crate::woff2::{max_compressed_size, Woff2Codec};

use crate::stream::{Readable, Reader, Writeable, Writer};
use std::fmt::{self, Debug, Display, Formatter};

/// Parse the table directory of a font face.
///
/// - The `data` must be in the OpenType font format.
/// - The `index` is only relevant if the data contains a font collection
///   (`.ttc` or `.otc` file). Otherwise, it must be 0.
fn parse(data: &[u8], index: u32) -> Result<Face<'_>> {
    let mut r = Reader::new(data);
    let mut kind = r.read::<FontKind>().ok_or(Error::UnknownKind)?;

    // Parse font collection header if necessary.
    if kind == FontKind::Collection {
        r.skip(4).ok_or(Error::MissingData)?; // version
        let num_fonts = r.read::<u32>().ok_or(Error::MissingData)?;
        if index >= num_fonts {
            return Err(Error::FaceIndexOutOfRange(index));
        }

        let offset = u32::read_at(data, 12 + 4 * (index as usize))
            .ok_or(Error::MissingData)?;
        let subdata = data.get(offset as usize..).ok_or(Error::InvalidOffset)?;
        r = Reader::new(subdata);
        kind = r.read::<FontKind>().ok_or(Error::UnknownKind)?;
        if kind == FontKind::Collection {
            return Err(Error::UnknownKind);
        }
    } else if index != 0 {
        return Err(Error::FaceIndexOutOfRange(index));
    }

    // Read number of table records.
    let count = r.read::<u16>().ok_or(Error::MissingData)?;
    r.skip(6).ok_or(Error::MissingData)?;

    // Read table records.
    let mut records = r.read_vector::<TableRecord>(count as usize).ok_or(Error::MissingData)?;

    // Lookup is a binary search, and not every font writer sorts its directory.
    records.sort_by_key(|record| record.tag);

    Ok(Face { data, kind, records })
}

/// Construct a brand new font from a list of tables.
///
/// Fails with [`Error::OverflowError`] if the table directory or a table
/// offset doesn't fit its field.
fn construct(kind: FontKind, mut tables: Vec<(Tag, Vec<u8>)>) -> Result<Vec<u8>> {
    // The directory header stores `count * 16` in 16 bits.
    let count = tables.len();
    if count > usize::from(u16::MAX) / 16 {
        return Err(Error::OverflowError);
    }

    let mut w = Writer::with_capacity(
        12 + 16 * count + tables.iter().map(|(_, t)| t.len() + 3).sum::<usize>(),
    );
    w.write::<FontKind>(kind);

    // Tables shall be sorted by tag.
    tables.sort_by_key(|&(tag, _)| tag);

    // Write table directory.
    let entry_selector = if count == 0 { 0 } else { count.ilog2() as usize };
    let search_range = (1 << entry_selector) * 16;
    let range_shift = (count * 16).saturating_sub(search_range);
    w.write(count as u16);
    w.write(search_range as u16);
    w.write(entry_selector as u16);
    w.write(range_shift as u16);

    // This variable will hold the offset to the checksum adjustment field
    // in the head table, which we'll have to write in the end (after
    // checksumming the whole font).
    let mut checksum_adjustment_offset = None;

    // Write table records.
    let mut offset = 12 + count * 16;
    for (tag, data) in &mut tables {
        if *tag == Tag::HEAD {
            // Zero out checksum field in head table.
            if let Some(field) = data.get_mut(8..12) {
                field.fill(0);
                checksum_adjustment_offset = Some(offset + 8);
            }
        }

        let len = data.len();
        w.write(TableRecord {
            tag: *tag,
            checksum: checksum(data),
            offset: u32::try_from(offset).map_err(|_| Error::OverflowError)?,
            length: u32::try_from(len).map_err(|_| Error::OverflowError)?,
        });

        // Increase offset, plus padding zeros to align to 4 bytes.
        offset += len;
        while offset % 4 != 0 {
            offset += 1;
        }
    }

    // Write tables.
    for (_, data) in &tables {
        // Write data plus padding zeros to align to 4 bytes.
        w.extend(data);
        w.align(4);
    }

    // Write checksum adjustment field in head table.
    let mut data = w.finish();
    if let Some(i) = checksum_adjustment_offset {
        let sum = checksum(&data);
        let val = 0xB1B0AFBA_u32.wrapping_sub(sum);
        data[i..i + 4].copy_from_slice(&val.to_be_bytes());
    }

    Ok(data)
}

/// Calculate a checksum over the sliced data as a sum of u32s. If the data
/// length is not a multiple of four, it is treated as if padded with zero to a
/// length that is a multiple of four.
fn checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    for chunk in data.chunks(4) {
        let mut bytes = [0; 4];
        bytes[..chunk.len()].copy_from_slice(chunk);
        sum = sum.wrapping_add(u32::from_be_bytes(bytes));
    }
    sum
}

/// A font face with OpenType tables.
struct Face<'a> {
    data: &'a [u8],
    kind: FontKind,
    records: Vec<TableRecord>,
}

impl<'a> Face<'a> {
    fn table(&self, tag: Tag) -> Option<&'a [u8]> {
        let i = self.records.binary_search_by(|record| record.tag.cmp(&tag)).ok()?;
        let record = self.records.get(i)?;
        let start = record.offset as usize;
        let end = start.checked_add(record.length as usize)?;
        self.data.get(start..end)
    }

    fn expect_table(&self, tag: Tag) -> Result<&'a [u8]> {
        self.table(tag).ok_or(Error::MissingTable(tag))
    }

    fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.records.iter().map(|record| record.tag)
    }
}

/// What kind of contents the font has.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum FontKind {
    /// TrueType outlines.
    TrueType,
    /// CFF outlines
    Cff,
    /// A font collection.
    Collection,
}

impl Readable<'_> for FontKind {
    const SIZE: usize = 4;

    fn read(r: &mut Reader) -> Option<Self> {
        match r.read::<u32>()? {
            0x00010000 | 0x74727565 => Some(FontKind::TrueType),
            0x4F54544F => Some(FontKind::Cff),
            0x74746366 => Some(FontKind::Collection),
            _ => None,
        }
    }
}

impl Writeable for FontKind {
    fn write(&self, w: &mut Writer) {
        w.write::<u32>(match self {
            FontKind::TrueType => 0x00010000,
            FontKind::Cff => 0x4F54544F,
            FontKind::Collection => 0x74746366,
        })
    }
}

/// A 4-byte OpenType tag.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Tag(pub [u8; 4]);

#[allow(unused)]
impl Tag {
    // General tables.
    /// The `cmap` table.
    pub const CMAP: Self = Self(*b"cmap");
    /// The `head` table.
    pub const HEAD: Self = Self(*b"head");
    /// The `hhea` table.
    pub const HHEA: Self = Self(*b"hhea");
    /// The `hmtx` table.
    pub const HMTX: Self = Self(*b"hmtx");
    /// The `maxp` table.
    pub const MAXP: Self = Self(*b"maxp");
    /// The `name` table.
    pub const NAME: Self = Self(*b"name");
    /// The `OS/2` table.
    pub const OS2: Self = Self(*b"OS/2");
    /// The `post` table.
    pub const POST: Self = Self(*b"post");
    /// The `vhea` table.
    pub const VHEA: Self = Self(*b"vhea");
    /// The `vmtx` table.
    pub const VMTX: Self = Self(*b"vmtx");

    // TrueType.
    /// The `glyf` table.
    pub const GLYF: Self = Self(*b"glyf");
    /// The `loca` table.
    pub const LOCA: Self = Self(*b"loca");
    /// The `prep` table.
    pub const PREP: Self = Self(*b"prep");
    /// The `fpgm` table.
    pub const FPGM: Self = Self(*b"fpgm");
    /// The `cvt ` table.
    pub const CVT: Self = Self(*b"cvt ");
    /// The `gasp` table.
    pub const GASP: Self = Self(*b"gasp");

    /// Tables that are only needed by the TrueType hinting machinery.
    pub const HINTING: [Self; 4] = [Self::FPGM, Self::PREP, Self::CVT, Self::GASP];

    /// Create a tag from a string like `"GSUB"`. Shorter strings are padded
    /// with spaces.
    pub fn new(tag: &str) -> Self {
        let mut bytes = [b' '; 4];
        for (slot, byte) in bytes.iter_mut().zip(tag.bytes()) {
            *slot = byte;
        }
        Self(bytes)
    }
}

impl Readable<'_> for Tag {
    const SIZE: usize = 4;

    fn read(r: &mut Reader) -> Option<Self> {
        r.read::<[u8; 4]>().map(Self)
    }
}

impl Writeable for Tag {
    fn write(&self, w: &mut Writer) {
        w.write::<[u8; 4]>(self.0)
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(std::str::from_utf8(&self.0).unwrap_or("..."))
    }
}

/// Locates a table in the font file.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct TableRecord {
    tag: Tag,
    checksum: u32,
    offset: u32,
    length: u32,
}

impl Readable<'_> for TableRecord {
    const SIZE: usize = 16;

    fn read(r: &mut Reader) -> Option<Self> {
        Some(TableRecord {
            tag: r.read::<Tag>()?,
            checksum: r.read::<u32>()?,
            offset: r.read::<u32>()?,
            length: r.read::<u32>()?,
        })
    }
}

impl Writeable for TableRecord {
    fn write(&self, w: &mut Writer) {
        w.write::<Tag>(self.tag);
        w.write::<u32>(self.checksum);
        w.write::<u32>(self.offset);
        w.write::<u32>(self.length);
    }
}

/// The result type for everything.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that occurred while loading, subsetting, transforming or writing
/// a font.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// The file contains an unknown kind of font.
    UnknownKind,
    /// An offset pointed outside of the data.
    InvalidOffset,
    /// Parsing expected more data.
    MissingData,
    /// Parsed data was invalid.
    InvalidData,
    /// A table is missing.
    ///
    /// Only tables that the font model cannot do without produce this error,
    /// e.g., `glyf` is present but `loca` is missing.
    MissingTable(Tag),
    /// The font relies on some unimplemented feature, e.g. CFF outlines.
    Unimplemented,
    /// The requested face index doesn't exist in the file.
    FaceIndexOutOfRange(u32),
    /// A value doesn't fit into the field it has to be written to.
    OverflowError,
    /// A font source could not be read from disk.
    SourceUnreadable,
    /// None of the requested codepoints is covered by a font source.
    ///
    /// The waterfall subsetter treats this as a reason to skip the source.
    NoIntersectingGlyphs,
    /// Some requested codepoints were not found in any font source.
    UnsatisfiedCodepoints(CodepointSet),
    /// A field that an operation requires is absent from the font.
    MissingRequiredField(&'static str),
    /// A field holds a value of the wrong shape.
    UnexpectedValueType(&'static str),
    /// A composite glyph (transitively) references itself.
    CyclicReferenceFound(GlyphId),
    /// A composite glyph references a glyph that doesn't exist.
    MissingGlyphInTable(GlyphId),
    /// A glyph has both an outline and component references.
    GlyphHasBothContoursAndReferences(GlyphId),
    /// An advance-width-to-em ratio was negative or larger than two.
    RatioOutOfRange,
    /// A units-per-em value outside of `16..=16384`.
    UnitsPerEmOutOfRange(u32),
    /// The font model is gone, because an earlier operation on it failed.
    MissingModel,
    /// WOFF2 compression failed.
    Woff2Encode,
    /// WOFF2 decompression failed or the input isn't WOFF2.
    Woff2Decode,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::UnknownKind => f.pad("unknown font kind"),
            Self::InvalidOffset => f.pad("invalid offset"),
            Self::MissingData => f.pad("missing more data"),
            Self::InvalidData => f.pad("invalid data"),
            Self::MissingTable(tag) => write!(f, "missing {tag} table"),
            Self::Unimplemented => f.pad("unimplemented feature in font"),
            Self::FaceIndexOutOfRange(index) => {
                write!(f, "face index {index} is out of range")
            }
            Self::OverflowError => f.pad("value overflows its field"),
            Self::SourceUnreadable => f.pad("font source is not readable"),
            Self::NoIntersectingGlyphs => {
                f.pad("font contains none of the requested codepoints")
            }
            Self::UnsatisfiedCodepoints(set) => {
                write!(f, "{} requested codepoints were not found in any font", set.len())
            }
            Self::MissingRequiredField(field) => write!(f, "missing required field {field}"),
            Self::UnexpectedValueType(field) => write!(f, "unexpected value for {field}"),
            Self::CyclicReferenceFound(gid) => {
                write!(f, "glyph {} references itself", gid.0)
            }
            Self::MissingGlyphInTable(gid) => {
                write!(f, "referenced glyph {} doesn't exist", gid.0)
            }
            Self::GlyphHasBothContoursAndReferences(gid) => {
                write!(f, "glyph {} has both contours and references", gid.0)
            }
            Self::RatioOutOfRange => f.pad("ratio must be between 0 and 2"),
            Self::UnitsPerEmOutOfRange(upem) => {
                write!(f, "units per em {upem} is outside of 16..=16384")
            }
            Self::MissingModel => f.pad("font model is unavailable after a failed operation"),
            Self::Woff2Encode => f.pad("woff2 compression failed"),
            Self::Woff2Decode => f.pad("woff2 decompression failed"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(count: usize) -> Vec<(Tag, Vec<u8>)> {
        (0..count)
            .map(|i| (Tag([b'z', (i >> 8) as u8, i as u8, b' ']), vec![0; 4]))
            .collect()
    }

    #[test]
    fn directory_header() {
        let data = construct(FontKind::TrueType, tags(5)).unwrap();
        let header = [0, 5, 0, 64, 0, 2, 0, 16];
        assert_eq!(data[4..12], header);
    }

    #[test]
    fn too_many_tables() {
        assert!(construct(FontKind::TrueType, tags(4095)).is_ok());
        assert_eq!(construct(FontKind::TrueType, tags(4096)), Err(Error::OverflowError));
    }
}
