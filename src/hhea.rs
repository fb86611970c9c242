//! The `hhea` and `vhea` tables share one layout: font-wide ascender,
//! descender and line gap, a few extents that are derived from the glyphs,
//! and the number of long metrics in `hmtx`/`vmtx`.

use crate::stream::Readable;
use crate::{Error, Result};

/// A horizontal (`hhea`) or vertical (`vhea`) metrics header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsHeader {
    /// Distance from the baseline to the top of the line.
    pub ascender: i16,
    /// Distance from the baseline to the bottom of the line, usually negative.
    pub descender: i16,
    /// Additional spacing between lines.
    pub line_gap: i16,
    data: Vec<u8>,
}

impl MetricsHeader {
    /// A fresh header with the given line metrics.
    pub fn new(ascender: i16, descender: i16, line_gap: i16) -> Self {
        let mut data = vec![0; 36];
        data[0..4].copy_from_slice(&0x00010000u32.to_be_bytes());
        data[18..20].copy_from_slice(&1i16.to_be_bytes()); // caret slope rise
        Self { ascender, descender, line_gap, data }
    }

    /// The number of long metrics the table was read with.
    pub(crate) fn num_long_metrics(&self) -> u16 {
        u16::read_at(&self.data, 34).unwrap_or(0)
    }
}

pub(crate) fn parse(data: &[u8]) -> Result<MetricsHeader> {
    if data.len() < 36 {
        return Err(Error::MissingData);
    }

    Ok(MetricsHeader {
        ascender: i16::read_at(data, 4).ok_or(Error::MissingData)?,
        descender: i16::read_at(data, 6).ok_or(Error::MissingData)?,
        line_gap: i16::read_at(data, 8).ok_or(Error::MissingData)?,
        data: data[..36].to_vec(),
    })
}

/// Values derived from the glyphs when writing.
#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct MetricsSummary {
    pub advance_max: u16,
    pub min_leading_bearing: i16,
    pub min_trailing_bearing: i16,
    pub max_extent: i16,
    pub num_long_metrics: u16,
}

pub(crate) fn write(header: &MetricsHeader, summary: MetricsSummary) -> Vec<u8> {
    let mut data = header.data.clone();
    data[4..6].copy_from_slice(&header.ascender.to_be_bytes());
    data[6..8].copy_from_slice(&header.descender.to_be_bytes());
    data[8..10].copy_from_slice(&header.line_gap.to_be_bytes());
    data[10..12].copy_from_slice(&summary.advance_max.to_be_bytes());
    data[12..14].copy_from_slice(&summary.min_leading_bearing.to_be_bytes());
    data[14..16].copy_from_slice(&summary.min_trailing_bearing.to_be_bytes());
    data[16..18].copy_from_slice(&summary.max_extent.to_be_bytes());
    data[34..36].copy_from_slice(&summary.num_long_metrics.to_be_bytes());
    data
}
