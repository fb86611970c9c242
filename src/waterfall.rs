//! Satisfying a set of codepoints from a ranked list of fonts.

use crate::codepoints::CodepointSet;
use crate::subset::{GlyphClosure, SubsetPrimitive};
use crate::{fs, Error, Result};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// Where a font comes from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FontSource {
    /// A font file in memory.
    Bytes(Vec<u8>),
    /// A font file on disk.
    Path(PathBuf),
}

impl FontSource {
    fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Self::Bytes(data) => Ok(data),
            Self::Path(path) => fs::read_source(&path).ok_or(Error::SourceUnreadable),
        }
    }
}

impl From<Vec<u8>> for FontSource {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(data)
    }
}

impl From<&[u8]> for FontSource {
    fn from(data: &[u8]) -> Self {
        Self::Bytes(data.to_vec())
    }
}

impl From<&Path> for FontSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for FontSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// The three ranks of font sources, in the order they are consulted.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Tier {
    Primary,
    CategoryBackup,
    LastResort,
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(match self {
            Self::Primary => "primary",
            Self::CategoryBackup => "category backup",
            Self::LastResort => "last resort",
        })
    }
}

/// Collects the glyphs for a set of codepoints from a ranked list of fonts.
///
/// Sources are consulted tier by tier, and within a tier in the order they
/// were added:
///
/// - **Primary** sources are subset to the requested codepoints they cover.
/// - **Category backup** sources are included whole if they cover any
///   requested codepoint.
/// - **Last resort** sources are subset like primary ones.
///
/// Codepoints that an earlier source provided are not requested from later
/// ones, and processing stops as soon as nothing is left.
///
/// ```no_run
/// # use fontsmith::WaterfallSubsetter;
/// # fn main() -> fontsmith::Result<()> {
/// let (faces, missing) = WaterfallSubsetter::new()
///     .add_primary(std::fs::read("Inter.ttf").unwrap_or_default(), 0)
///     .add_category_backup(std::path::Path::new("NotoEmoji.ttf"), 0)
///     .add_text("Hi 👋")
///     .run_best_effort()?;
/// # Ok(())
/// # }
/// ```
pub struct WaterfallSubsetter<P: SubsetPrimitive = GlyphClosure> {
    primitive: P,
    primary: Vec<P::Face>,
    category_backup: Vec<P::Face>,
    last_resort: Vec<P::Face>,
    requested: CodepointSet,
}

impl WaterfallSubsetter {
    /// A subsetter with the default primitive.
    pub fn new() -> Self {
        Self::with_primitive(GlyphClosure::default())
    }
}

impl Default for WaterfallSubsetter {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SubsetPrimitive> WaterfallSubsetter<P> {
    /// A subsetter that produces faces with `primitive`.
    pub fn with_primitive(primitive: P) -> Self {
        Self {
            primitive,
            primary: vec![],
            category_backup: vec![],
            last_resort: vec![],
            requested: CodepointSet::new(),
        }
    }

    /// Add a source that is subset to the codepoints it provides.
    ///
    /// A source that can't be loaded is skipped.
    pub fn add_primary(mut self, source: impl Into<FontSource>, index: u32) -> Self {
        if let Some(face) = self.load(source.into(), index, Tier::Primary) {
            self.primary.push(face);
        }
        self
    }

    /// Add a source that is included whole if it provides any requested
    /// codepoint.
    ///
    /// A source that can't be loaded is skipped.
    pub fn add_category_backup(mut self, source: impl Into<FontSource>, index: u32) -> Self {
        if let Some(face) = self.load(source.into(), index, Tier::CategoryBackup) {
            self.category_backup.push(face);
        }
        self
    }

    /// Add a source that is consulted after all others and subset like a
    /// primary one.
    ///
    /// A source that can't be loaded is skipped.
    pub fn add_last_resort(mut self, source: impl Into<FontSource>, index: u32) -> Self {
        if let Some(face) = self.load(source.into(), index, Tier::LastResort) {
            self.last_resort.push(face);
        }
        self
    }

    fn load(&self, source: FontSource, index: u32, tier: Tier) -> Option<P::Face> {
        let name = match &source {
            FontSource::Path(path) => path.display().to_string(),
            FontSource::Bytes(data) => format!("of {} bytes", data.len()),
        };

        match source.into_bytes().and_then(|data| self.primitive.load(data, index)) {
            Ok(face) => Some(face),
            Err(err) => {
                log::warn!("dropping {tier} source {name}: {err}");
                None
            }
        }
    }

    /// Request a codepoint.
    pub fn add_codepoint(mut self, codepoint: u32) -> Self {
        self.requested.insert(codepoint);
        self
    }

    /// Request several codepoints.
    pub fn add_codepoints(mut self, codepoints: impl IntoIterator<Item = u32>) -> Self {
        self.requested.extend(codepoints);
        self
    }

    /// Request every character of a string.
    pub fn add_text(mut self, text: &str) -> Self {
        self.requested.extend(text.chars().map(u32::from));
        self
    }

    /// The requested codepoints.
    pub fn requested(&self) -> &CodepointSet {
        &self.requested
    }

    /// Produce the faces for all requested codepoints.
    ///
    /// Fails with [`Error::UnsatisfiedCodepoints`] if some codepoints are in
    /// none of the sources.
    pub fn run(&self) -> Result<Vec<Vec<u8>>> {
        let (faces, leftover) = self.run_best_effort()?;
        if !leftover.is_empty() {
            return Err(Error::UnsatisfiedCodepoints(leftover));
        }
        Ok(faces)
    }

    /// Produce the faces for as many requested codepoints as possible and
    /// return them with the codepoints no source provides.
    pub fn run_best_effort(&self) -> Result<(Vec<Vec<u8>>, CodepointSet)> {
        let mut remaining = self.requested.clone();
        let mut faces = vec![];

        let tiers = [
            (Tier::Primary, &self.primary),
            (Tier::CategoryBackup, &self.category_backup),
            (Tier::LastResort, &self.last_resort),
        ];

        'tiers: for (tier, sources) in tiers {
            for (i, face) in sources.iter().enumerate() {
                if remaining.is_empty() {
                    break 'tiers;
                }

                let found = self.primitive.collect_coverage(face).intersection(&remaining);
                if found.is_empty() {
                    log::debug!("{tier} source {i} provides nothing, skipping it");
                    continue;
                }

                let data = match tier {
                    Tier::CategoryBackup => face.as_ref().to_vec(),
                    Tier::Primary | Tier::LastResort => {
                        match self.primitive.subset(face, &found) {
                            Ok(data) => data,
                            Err(Error::NoIntersectingGlyphs) => continue,
                            Err(err) => return Err(err),
                        }
                    }
                };

                log::debug!("{tier} source {i} provides {} codepoints", found.len());
                faces.push(data);
                remaining = remaining.symmetric_difference(&found);
            }
        }

        if !remaining.is_empty() {
            log::debug!("{} codepoints are in no source", remaining.len());
        }

        Ok((faces, remaining))
    }
}
