//! WOFF2 packaging of finished fonts.

use crate::Result;

/// Converts between TrueType and WOFF2 files.
pub trait Woff2Codec {
    /// Compress a TrueType file.
    fn encode(&self, ttf: &[u8]) -> Result<Vec<u8>>;

    /// Decompress a WOFF2 file into a TrueType file.
    fn decode(&self, woff2: &[u8]) -> Result<Vec<u8>>;
}

/// An upper bound for the size of the WOFF2 file of `ttf`, for callers that
/// want to allocate up front.
pub fn max_compressed_size(ttf: &[u8], extended_metadata: &str) -> usize {
    ttf.len() + 1024 + extended_metadata.len()
}

/// WOFF2 through the `woff` crate, with the highest Brotli quality and the
/// `glyf` transform.
#[cfg(feature = "woff2")]
#[derive(Debug, Clone, Default)]
pub struct Woff2 {
    metadata: String,
}

#[cfg(feature = "woff2")]
impl Woff2 {
    const QUALITY: usize = 11;

    /// Embed extended metadata (an XML document) into encoded files.
    pub fn with_metadata(metadata: impl Into<String>) -> Self {
        Self { metadata: metadata.into() }
    }
}

#[cfg(feature = "woff2")]
impl Woff2Codec for Woff2 {
    fn encode(&self, ttf: &[u8]) -> Result<Vec<u8>> {
        let woff2 = woff::version2::compress(ttf, self.metadata.clone(), Self::QUALITY, true)
            .ok_or(crate::Error::Woff2Encode)?;
        log::debug!(
            "compressed {} bytes to {} (bound {})",
            ttf.len(),
            woff2.len(),
            max_compressed_size(ttf, &self.metadata)
        );
        Ok(woff2)
    }

    fn decode(&self, woff2: &[u8]) -> Result<Vec<u8>> {
        woff::version2::decompress(woff2).ok_or(crate::Error::Woff2Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_covers_metadata() {
        assert_eq!(max_compressed_size(&[0; 100], ""), 1124);
        assert_eq!(max_compressed_size(&[0; 100], "<metadata/>"), 1135);
    }

    #[cfg(feature = "woff2")]
    #[test]
    fn round_trip() {
        use crate::codec::{FontCodec, Options, Sfnt};
        use crate::model::{FontModel, Glyph, Point};

        let mut model = FontModel::new(1000);
        let contour = vec![Point::on(50, 0), Point::on(50, 700), Point::on(450, 700)];
        model.glyphs = vec![Glyph::empty(500), Glyph::simple(500, vec![contour])];
        model.cmap.insert(u32::from('a'), crate::GlyphId(1));

        let options = Options::default();
        let ttf = Sfnt.serialize(&model, &options).unwrap();
        let woff2 = Woff2::default().encode(&ttf).unwrap();
        assert!(woff2.starts_with(b"wOF2"));
        assert!(woff2.len() <= max_compressed_size(&ttf, ""));

        let decoded = Woff2::default().decode(&woff2).unwrap();
        let parsed = Sfnt.parse(&decoded, 0, &options).unwrap();
        assert_eq!(parsed.glyphs, model.glyphs);
        assert_eq!(parsed.cmap, model.cmap);
    }
}
