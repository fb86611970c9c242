use fontsmith::{
    Centering, ComponentReference, Error, FontCodec, GlyphId, Modifier, Options, Point, Sfnt, Tag,
};

mod common;

use common::{add_composite, add_simple, empty_model, font_with, model_with, parse, serialize};

#[test]
fn test_units_per_em_round_trip() {
    let data = font_with("abcxyz");
    let original = parse(&data);

    let mut modifier = Modifier::new(&data, 0, Options::default()).unwrap();
    modifier.change_units_per_em(2000).unwrap().change_units_per_em(1000).unwrap();

    let font = modifier.font().unwrap();
    assert_eq!(font.units_per_em(), Ok(1000));
    for (before, after) in original.glyphs.iter().zip(&font.glyphs) {
        assert_eq!(before.advance_width, after.advance_width);
        for (p, q) in before.points().zip(after.points()) {
            assert!((p.x - q.x).abs() <= 1 && (p.y - q.y).abs() <= 1);
        }
    }
}

#[test]
fn test_units_per_em_scales_metrics() {
    let mut modifier = Modifier::new(&font_with("a"), 0, Options::default()).unwrap();
    let ttf = modifier.change_units_per_em(2048).unwrap().export_result().unwrap();

    let face = ttf_parser::Face::parse(&ttf, 0).unwrap();
    let a = face.glyph_index('a').unwrap();
    assert_eq!(face.units_per_em(), 2048);
    assert_eq!(face.ascender(), 1638);
    assert_eq!(face.descender(), -410);
    assert_eq!(face.glyph_hor_advance(a), Some(1229));
    assert_eq!(face.glyph_bounding_box(a).map(|r| (r.x_min, r.y_max)), Some((82, 1434)));
}

#[test]
fn test_units_per_em_out_of_range() {
    let mut modifier = Modifier::from_model(model_with("a"), Options::default());
    assert_eq!(
        modifier.change_units_per_em(16385).map(|_| ()),
        Err(Error::UnitsPerEmOutOfRange(16385))
    );
    assert_eq!(modifier.font().err(), Some(Error::MissingModel));
}

#[test]
fn test_monospace_centers_ink() {
    let mut model = empty_model();
    let a = add_simple(&mut model, 'a', 600, -10, 590);
    let mark = add_simple(&mut model, '\u{301}', 0, -200, -50);

    let mut modifier = Modifier::from_model(model, Options::default());
    let ttf = modifier.change_make_monospaced(1000).unwrap().export_result().unwrap();

    let face = ttf_parser::Face::parse(&ttf, 0).unwrap();
    let a = ttf_parser::GlyphId(a.0);
    let mark = ttf_parser::GlyphId(mark.0);
    let bbox = face.glyph_bounding_box(a).unwrap();

    assert!(face.is_monospaced());
    assert_eq!(face.glyph_hor_advance(a), Some(1000));
    assert!((i32::from(bbox.x_min) + i32::from(bbox.x_max) - 1000).abs() <= 2);
    assert_eq!(face.glyph_hor_advance(mark), Some(0));
    assert_eq!(face.glyph_hor_side_bearing(mark), Some(-200));

    let os2 = modifier.font().unwrap().os2.as_ref().unwrap();
    assert_eq!(os2.x_avg_char_width, 1000);
}

#[test]
fn test_monospace_composite_stays_consistent() {
    let mut model = empty_model();
    let base = add_simple(&mut model, 'A', 500, 100, 400);
    let mark = add_simple(&mut model, '\u{308}', 0, -250, -50);
    let composite = add_composite(
        &mut model,
        'Ä',
        500,
        vec![ComponentReference::new(base, 0, 0), ComponentReference::new(mark, 400, 0)],
    );

    let mut modifier = Modifier::from_model(model, Options::default());
    modifier.change_make_monospaced(600).unwrap();

    let font = modifier.font().unwrap();
    assert_eq!(font.glyphs[base.0 as usize].x_extent(), Some((150, 450)));
    assert_eq!(font.glyphs[mark.0 as usize].x_extent(), Some((-250, -50)));

    let references = &font.glyphs[composite.0 as usize].references;
    assert_eq!(references[0].x, 0);
    assert_eq!(references[1].x, 450);

    let ttf = modifier.export_result().unwrap();
    let face = ttf_parser::Face::parse(&ttf, 0).unwrap();
    let bbox = face.glyph_bounding_box(ttf_parser::GlyphId(composite.0)).unwrap();
    assert_eq!((bbox.x_min, bbox.x_max), (150, 450));
    assert_eq!(face.glyph_hor_advance(ttf_parser::GlyphId(composite.0)), Some(600));
}

#[test]
fn test_monospace_proportional_centering() {
    let mut model = empty_model();
    let a = add_simple(&mut model, 'a', 601, 100, 501);

    let options = Options::default().with_centering(Centering::Proportional);
    let mut modifier = Modifier::from_model(model, options);
    modifier.change_make_monospaced(1000).unwrap();

    let glyph = &modifier.font().unwrap().glyphs[a.0 as usize];
    assert_eq!(glyph.x_extent(), Some((299, 700)));
}

#[test]
fn test_monospace_detects_cycles() {
    let mut model = empty_model();
    let first = GlyphId(1);
    let second = GlyphId(2);
    add_composite(&mut model, 'a', 500, vec![ComponentReference::new(second, 0, 0)]);
    add_composite(&mut model, 'b', 500, vec![ComponentReference::new(first, 0, 0)]);

    let mut modifier = Modifier::from_model(model, Options::default());
    let result = modifier.change_make_monospaced(600).map(|_| ());
    assert!(matches!(result, Err(Error::CyclicReferenceFound(_))));

    assert_eq!(modifier.export_result(), Err(Error::MissingModel));
    assert_eq!(modifier.remove_hints().map(|_| ()), Err(Error::MissingModel));
}

#[test]
fn test_monospace_rejects_broken_glyphs() {
    let mut model = empty_model();
    add_composite(&mut model, 'a', 500, vec![ComponentReference::new(GlyphId(99), 0, 0)]);
    let mut modifier = Modifier::from_model(model, Options::default());
    assert_eq!(
        modifier.change_make_monospaced(600).map(|_| ()),
        Err(Error::MissingGlyphInTable(GlyphId(99)))
    );

    let mut model = empty_model();
    let base = add_simple(&mut model, 'a', 500, 0, 100);
    let broken = add_simple(&mut model, 'b', 500, 0, 100);
    model.glyphs[broken.0 as usize].references.push(ComponentReference::new(base, 0, 0));
    let mut modifier = Modifier::from_model(model, Options::default());
    assert_eq!(
        modifier.change_make_monospaced(600).map(|_| ()),
        Err(Error::GlyphHasBothContoursAndReferences(broken))
    );
}

#[test]
fn test_monospace_by_em_ratio() {
    let mut modifier = Modifier::new(&font_with("ab"), 0, Options::default()).unwrap();
    modifier.change_make_monospaced_by_em_ratio(0.6).unwrap();
    let font = modifier.font().unwrap();
    assert!(font.glyphs.iter().all(|glyph| glyph.advance_width == 600));

    let mut modifier = Modifier::new(&font_with("ab"), 0, Options::default()).unwrap();
    assert_eq!(
        modifier.change_make_monospaced_by_em_ratio(2.5).map(|_| ()),
        Err(Error::RatioOutOfRange)
    );
    assert_eq!(modifier.font().err(), Some(Error::MissingModel));

    let mut modifier = Modifier::new(&font_with("ab"), 0, Options::default()).unwrap();
    assert_eq!(
        modifier.change_make_monospaced_by_em_ratio(-0.1).map(|_| ()),
        Err(Error::RatioOutOfRange)
    );
}

#[test]
fn test_remove_hints() {
    let mut model = model_with("ab");
    model.glyphs[1].instructions = vec![0xB0, 0x01, 0x2B];
    model.set_table(Tag::FPGM, vec![0xB0, 0x00, 0x2C]).unwrap();
    model.set_table(Tag::PREP, vec![0xB0, 0x00]).unwrap();
    let data = serialize(&model);

    let keep = Options::default().with_ignore_hints(false);
    let mut modifier = Modifier::new(&data, 0, keep.clone()).unwrap();
    assert_eq!(modifier.font().unwrap().glyphs[1].instructions, [0xB0, 0x01, 0x2B]);
    assert!(modifier.font().unwrap().table(Tag::FPGM).is_some());

    modifier.remove_hints().unwrap();
    let once = modifier.font().unwrap().clone();
    modifier.remove_hints().unwrap();
    assert_eq!(modifier.font().unwrap(), &once);

    let ttf = modifier.export_result().unwrap();
    let reparsed = Sfnt.parse(&ttf, 0, &keep).unwrap();
    assert!(reparsed.glyphs.iter().all(|glyph| glyph.instructions.is_empty()));
    assert!(reparsed.table(Tag::FPGM).is_none());
    assert!(reparsed.table(Tag::PREP).is_none());
}

#[test]
fn test_delete_table() {
    let mut model = model_with("a");
    model.set_table(Tag::NAME, vec![0; 6]).unwrap();

    let mut modifier = Modifier::from_model(model, Options::default());
    assert_eq!(modifier.delete_table(Tag::NAME), Ok(true));
    assert_eq!(modifier.delete_table(Tag::NAME), Ok(false));
    assert_eq!(modifier.delete_table(Tag::POST), Ok(true));

    let ttf = modifier.export_result().unwrap();
    let face = ttf_parser::Face::parse(&ttf, 0).unwrap();
    assert!(face.tables().post.is_none());
    assert!(face.tables().name.is_none());

    assert!(matches!(modifier.delete_table(Tag::HEAD), Err(Error::MissingRequiredField(_))));
    assert_eq!(modifier.delete_table(Tag::NAME), Err(Error::MissingModel));
}

#[test]
fn test_modifier_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("font.ttf");
    std::fs::write(&path, font_with("a")).unwrap();

    let modifier = Modifier::from_path(&path, 0, Options::default()).unwrap();
    assert_eq!(modifier.font().unwrap().num_glyphs(), 2);

    let missing = Modifier::from_path(dir.path().join("missing.ttf"), 0, Options::default());
    assert_eq!(missing.err(), Some(Error::SourceUnreadable));
}

#[test]
fn test_transforms_chain() {
    let mut model = empty_model();
    model.glyphs[0].contours.push(vec![Point::on(0, 0), Point::on(10, 10), Point::off(20, 0)]);
    add_simple(&mut model, 'i', 300, 120, 180);
    let data = serialize(&model);

    let mut modifier = Modifier::new(&data, 0, Options::default()).unwrap();
    let ttf = modifier
        .change_units_per_em(2000)
        .unwrap()
        .change_make_monospaced_by_em_ratio(0.5)
        .unwrap()
        .remove_hints()
        .unwrap()
        .export_result()
        .unwrap();

    let face = ttf_parser::Face::parse(&ttf, 0).unwrap();
    let i = face.glyph_index('i').unwrap();
    assert_eq!(face.units_per_em(), 2000);
    assert_eq!(face.glyph_hor_advance(i), Some(1000));
    let bbox = face.glyph_bounding_box(i).unwrap();
    assert_eq!((bbox.x_min, bbox.x_max), (440, 560));
}

#[test]
fn test_monospace_at_widest_ratio() {
    let mut model = model_with("ab");
    if let Some(head) = &mut model.head {
        head.units_per_em = 16384;
    }

    let mut modifier = Modifier::from_model(model, Options::default());
    modifier.change_make_monospaced_by_em_ratio(2.0).unwrap();

    let font = modifier.font().unwrap();
    assert!(font.glyphs.iter().all(|glyph| glyph.advance_width == 32768));
    assert_eq!(font.os2.as_ref().map(|os2| os2.x_avg_char_width), Some(i16::MAX));
}
