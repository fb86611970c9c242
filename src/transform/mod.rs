//! Metric transforms on a parsed font.

use crate::codec::{FontCodec, Options, Sfnt};
use crate::model::FontModel;
use crate::{fs, Error, Result, Tag};
use std::path::Path;

mod hints;
mod monospace;
mod scale;

/// Owns a parsed font and applies metric transforms to it.
///
/// Every transform either succeeds completely or leaves the modifier without
/// a font: a failed transform may have changed the font halfway, so the font
/// is dropped and all later calls fail with [`Error::MissingModel`].
///
/// ```no_run
/// # use fontsmith::{Modifier, Options};
/// # fn main() -> fontsmith::Result<()> {
/// let data = std::fs::read("Inter.ttf").unwrap_or_default();
/// let ttf = Modifier::new(&data, 0, Options::default())?
///     .change_units_per_em(1000)?
///     .remove_hints()?
///     .export_result()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Modifier<C: FontCodec = Sfnt> {
    codec: C,
    options: Options,
    model: Option<FontModel>,
}

impl Modifier {
    /// Parse the face at `index` of a font file.
    pub fn new(data: &[u8], index: u32, options: Options) -> Result<Self> {
        Self::with_codec(Sfnt, data, index, options)
    }

    /// Read and parse the face at `index` of a font file on disk.
    pub fn from_path(path: impl AsRef<Path>, index: u32, options: Options) -> Result<Self> {
        let data = fs::read_source(path).ok_or(Error::SourceUnreadable)?;
        Self::new(&data, index, options)
    }

    /// Take over an existing model.
    pub fn from_model(model: FontModel, options: Options) -> Self {
        Self { codec: Sfnt, options, model: Some(model) }
    }
}

impl<C: FontCodec> Modifier<C> {
    /// Parse the face at `index` of a font file with a custom codec.
    pub fn with_codec(codec: C, data: &[u8], index: u32, options: Options) -> Result<Self> {
        let model = codec.parse(data, index, &options)?;
        Ok(Self { codec, options, model: Some(model) })
    }

    /// The options the modifier was created with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The font.
    pub fn font(&self) -> Result<&FontModel> {
        self.model.as_ref().ok_or(Error::MissingModel)
    }

    /// The font, for direct edits.
    pub fn font_mut(&mut self) -> Result<&mut FontModel> {
        self.model.as_mut().ok_or(Error::MissingModel)
    }

    /// Release the font.
    pub fn into_model(self) -> Result<FontModel> {
        self.model.ok_or(Error::MissingModel)
    }

    /// Run `f` on the model and only keep the model if it succeeds.
    fn apply<T>(&mut self, f: impl FnOnce(&mut FontModel, &Options) -> Result<T>) -> Result<T> {
        let mut model = self.model.take().ok_or(Error::MissingModel)?;
        let value = f(&mut model, &self.options)?;
        self.model = Some(model);
        Ok(value)
    }

    /// Rescale the font to a grid of `units_per_em` units.
    ///
    /// Advances, outlines, component offsets and the line metrics of `hhea`,
    /// `vhea` and `OS/2` are scaled by the same factor and rounded.
    pub fn change_units_per_em(&mut self, units_per_em: u32) -> Result<&mut Self> {
        self.apply(|model, _| scale::change_units_per_em(model, units_per_em))?;
        Ok(self)
    }

    /// Give every glyph with a nonzero advance the advance `width` and move
    /// its ink so that it stays centered.
    ///
    /// Glyphs with a zero advance, like combining marks, keep their advance
    /// and their position.
    pub fn change_make_monospaced(&mut self, width: u16) -> Result<&mut Self> {
        self.apply(|model, options| monospace::make_monospaced(model, width, options.centering))?;
        Ok(self)
    }

    /// Like [`change_make_monospaced`](Self::change_make_monospaced) with a
    /// width relative to the em. `ratio` must be in `0.0..=2.0`.
    pub fn change_make_monospaced_by_em_ratio(&mut self, ratio: f64) -> Result<&mut Self> {
        self.apply(|model, options| {
            if !(0.0..=2.0).contains(&ratio) {
                return Err(Error::RatioOutOfRange);
            }

            let width = (f64::from(model.units_per_em()?) * ratio).round();
            let width = u16::try_from(width as i64).map_err(|_| Error::OverflowError)?;
            monospace::make_monospaced(model, width, options.centering)
        })?;
        Ok(self)
    }

    /// Drop all TrueType hinting from the font.
    pub fn remove_hints(&mut self) -> Result<&mut Self> {
        self.apply(|model, _| {
            hints::remove_hints(model);
            Ok(())
        })?;
        Ok(self)
    }

    /// Remove a table from the font. Returns whether it was present.
    pub fn delete_table(&mut self, tag: Tag) -> Result<bool> {
        self.apply(|model, _| {
            let removed = model.remove_table(tag)?;
            if removed {
                log::debug!("deleted {tag} table");
            }
            Ok(removed)
        })
    }

    /// Write the font into a TrueType file.
    pub fn export_result(&self) -> Result<Vec<u8>> {
        self.codec.serialize(self.font()?, &self.options)
    }
}
