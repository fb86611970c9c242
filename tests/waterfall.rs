use fontsmith::{CodepointSet, Error, SubsetPrimitive, WaterfallSubsetter};
use std::path::Path;

mod common;

use common::{coverage, font_with};

#[test]
fn test_complete_waterfall() {
    let faces = WaterfallSubsetter::new()
        .add_primary(font_with("abc"), 0)
        .add_last_resort(font_with("cdefgh"), 0)
        .add_text("abcdef")
        .run()
        .unwrap();

    assert_eq!(faces.len(), 2);
    assert_eq!(coverage(&faces[0]), CodepointSet::from_text("abc"));
    assert_eq!(coverage(&faces[1]), CodepointSet::from_text("def"));
}

#[test]
fn test_partial_waterfall() {
    let subsetter = WaterfallSubsetter::new()
        .add_primary(font_with("abc"), 0)
        .add_last_resort(font_with("xy"), 0)
        .add_codepoints("abxyz".chars().map(u32::from));

    let (faces, leftover) = subsetter.run_best_effort().unwrap();
    assert_eq!(faces.len(), 2);
    assert_eq!(leftover, CodepointSet::from([u32::from('z')]));

    assert_eq!(
        subsetter.run(),
        Err(Error::UnsatisfiedCodepoints(CodepointSet::from([u32::from('z')])))
    );

    // The builder is not consumed by running it.
    assert_eq!(subsetter.requested().len(), 5);
}

#[test]
fn test_primary_wins_over_last_resort() {
    let faces = WaterfallSubsetter::new()
        .add_last_resort(font_with("ab"), 0)
        .add_primary(font_with("a"), 0)
        .add_text("ab")
        .run()
        .unwrap();

    assert_eq!(faces.len(), 2);
    assert_eq!(coverage(&faces[0]), CodepointSet::from_text("a"));
    assert_eq!(coverage(&faces[1]), CodepointSet::from_text("b"));
}

#[test]
fn test_category_backup_is_included_whole() {
    let backup = font_with("0123456789");
    let faces = WaterfallSubsetter::new()
        .add_primary(font_with("ab"), 0)
        .add_category_backup(font_with("%"), 0)
        .add_category_backup(backup.clone(), 0)
        .add_text("ab7")
        .run()
        .unwrap();

    assert_eq!(faces.len(), 2);
    assert_eq!(faces[1], backup);
}

#[test]
fn test_stops_when_satisfied() {
    let faces = WaterfallSubsetter::new()
        .add_primary(font_with("abc"), 0)
        .add_category_backup(font_with("abc"), 0)
        .add_last_resort(font_with("abc"), 0)
        .add_text("cab")
        .run()
        .unwrap();

    assert_eq!(faces.len(), 1);
}

#[test]
fn test_broken_sources_are_dropped() {
    let faces = WaterfallSubsetter::new()
        .add_primary(vec![0, 1, 0, 0, 0xFF], 0)
        .add_primary(Path::new("does/not/exist.ttf"), 0)
        .add_primary(font_with("a"), 3)
        .add_last_resort(font_with("a"), 0)
        .add_codepoint(u32::from('a'))
        .run()
        .unwrap();

    assert_eq!(faces.len(), 1);
    assert_eq!(coverage(&faces[0]), CodepointSet::from_text("a"));
}

#[test]
fn test_nothing_requested() {
    let (faces, leftover) =
        WaterfallSubsetter::new().add_primary(font_with("a"), 0).run_best_effort().unwrap();
    assert!(faces.is_empty());
    assert!(leftover.is_empty());
}

#[test]
fn test_subset_keeps_metrics() {
    let faces = WaterfallSubsetter::new()
        .add_primary(font_with("abcde"), 0)
        .add_text("eb")
        .run()
        .unwrap();

    let original = font_with("abcde");
    let ttf = ttf_parser::Face::parse(&original, 0).unwrap();
    let ttfs = ttf_parser::Face::parse(&faces[0], 0).unwrap();
    assert_eq!(ttfs.number_of_glyphs(), 3);

    for c in "eb".chars() {
        macro_rules! same {
            ($method:ident) => {
                assert_eq!(
                    ttf.$method(ttf.glyph_index(c).unwrap()),
                    ttfs.$method(ttfs.glyph_index(c).unwrap()),
                );
            };
        }
        same!(glyph_hor_advance);
        same!(glyph_hor_side_bearing);
        same!(glyph_bounding_box);
    }
}

/// Faces are plain text: the characters are the coverage, and a leading
/// `!` or `?` makes subsetting find nothing or fail.
struct TextPrimitive;

impl SubsetPrimitive for TextPrimitive {
    type Face = Vec<u8>;

    fn load(&self, data: Vec<u8>, _: u32) -> fontsmith::Result<Vec<u8>> {
        Ok(data)
    }

    fn collect_coverage(&self, face: &Vec<u8>) -> CodepointSet {
        face.iter().filter(|&&b| !b"!?".contains(&b)).map(|&b| u32::from(b)).collect()
    }

    fn subset(&self, face: &Vec<u8>, codepoints: &CodepointSet) -> fontsmith::Result<Vec<u8>> {
        match face.first() {
            Some(b'!') => Err(Error::NoIntersectingGlyphs),
            Some(b'?') => Err(Error::InvalidData),
            _ => Ok(codepoints.iter().map(|c| c as u8).collect()),
        }
    }
}

#[test]
fn test_empty_subset_is_skipped() {
    let (faces, leftover) = WaterfallSubsetter::with_primitive(TextPrimitive)
        .add_primary(b"!ab".as_slice(), 0)
        .add_last_resort(b"abc".as_slice(), 0)
        .add_text("ab")
        .run_best_effort()
        .unwrap();

    assert_eq!(faces, [b"ab".to_vec()]);
    assert!(leftover.is_empty());
}

#[test]
fn test_subset_failure_is_fatal() {
    let subsetter = WaterfallSubsetter::with_primitive(TextPrimitive)
        .add_primary(b"?ab".as_slice(), 0)
        .add_last_resort(b"ab".as_slice(), 0)
        .add_text("ab");

    assert_eq!(subsetter.run(), Err(Error::InvalidData));
    assert_eq!(subsetter.run_best_effort(), Err(Error::InvalidData));
}
