use crate::model::FontModel;
use crate::Tag;

/// Clear all glyph programs and remove the tables of the TrueType
/// interpreter.
pub(crate) fn remove_hints(model: &mut FontModel) {
    for glyph in &mut model.glyphs {
        glyph.instructions = Vec::new();
    }

    for tag in Tag::HINTING {
        if model.tables.remove(&tag).is_some() {
            log::debug!("removed {tag} table");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Glyph;

    #[test]
    fn idempotent() {
        let mut model = FontModel::new(1000);
        let mut glyph = Glyph::empty(500);
        glyph.instructions = vec![0xB0, 0x00];
        model.glyphs.push(glyph);
        model.set_table(Tag::FPGM, vec![1, 2, 3]).unwrap();
        model.set_table(Tag::NAME, vec![0; 6]).unwrap();

        remove_hints(&mut model);
        let once = model.clone();
        remove_hints(&mut model);

        assert_eq!(model, once);
        assert!(model.glyphs[0].instructions.is_empty());
        assert_eq!(model.raw_tags().collect::<Vec<_>>(), [Tag::NAME]);
    }
}
