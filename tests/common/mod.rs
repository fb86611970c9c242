#![allow(dead_code)]

use fontsmith::{
    CodepointSet, ComponentReference, Contour, FontCodec, FontModel, Glyph, GlyphId, Options,
    Point, Sfnt,
};

/// A closed box from `left` to `right`.
pub fn rect(left: i32, right: i32, top: i32) -> Contour {
    vec![Point::on(left, 0), Point::on(left, top), Point::on(right, top), Point::on(right, 0)]
}

/// A font on a 1000 unit grid with a boxed `.notdef`.
pub fn empty_model() -> FontModel {
    let mut model = FontModel::new(1000);
    model.push_glyph(Glyph::simple(500, vec![rect(50, 450, 700)])).unwrap();
    model
}

/// Map `c` to a new simple glyph.
pub fn add_simple(model: &mut FontModel, c: char, advance: u16, left: i32, right: i32) -> GlyphId {
    let gid = model.push_glyph(Glyph::simple(advance, vec![rect(left, right, 700)])).unwrap();
    model.cmap.insert(u32::from(c), gid);
    gid
}

/// Map `c` to a new composite glyph.
pub fn add_composite(
    model: &mut FontModel,
    c: char,
    advance: u16,
    references: Vec<ComponentReference>,
) -> GlyphId {
    let gid = model.push_glyph(Glyph::composite(advance, references)).unwrap();
    model.cmap.insert(u32::from(c), gid);
    gid
}

/// A model with one box glyph per character of `chars`.
pub fn model_with(chars: &str) -> FontModel {
    let mut model = empty_model();
    for (i, c) in chars.chars().enumerate() {
        let left = 40 + 10 * (i as i32 % 5);
        add_simple(&mut model, c, 600, left, 560);
    }
    model
}

/// A font file with one box glyph per character of `chars`.
pub fn font_with(chars: &str) -> Vec<u8> {
    serialize(&model_with(chars))
}

pub fn serialize(model: &FontModel) -> Vec<u8> {
    Sfnt.serialize(model, &Options::default()).unwrap()
}

pub fn parse(data: &[u8]) -> FontModel {
    Sfnt.parse(data, 0, &Options::default()).unwrap()
}

/// The codepoints a font maps to a real glyph, read with `ttf-parser`.
pub fn coverage(data: &[u8]) -> CodepointSet {
    let face = ttf_parser::Face::parse(data, 0).unwrap();
    let mut set = CodepointSet::new();
    for subtable in face.tables().cmap.unwrap().subtables {
        if !subtable.is_unicode() {
            continue;
        }

        subtable.codepoints(|c| {
            if subtable.glyph_index(c).is_some_and(|g| g.0 != 0) {
                set.insert(c);
            }
        });
    }
    set
}
