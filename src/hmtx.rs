//! The `hmtx` and `vmtx` tables. Both store one long metric (advance and
//! side bearing) for the first `numberOfHMetrics`/`numOfLongVerMetrics`
//! glyphs and only side bearings for the rest, which reuse the last advance.

use crate::stream::{Reader, Writer};
use crate::{Error, Result};

/// Read `(advance, side bearing)` for every glyph.
pub(crate) fn parse(data: &[u8], num_long_metrics: u16, num_glyphs: usize) -> Result<Vec<(u16, i16)>> {
    let num_long_metrics = usize::from(num_long_metrics).min(num_glyphs);
    if num_long_metrics == 0 && num_glyphs > 0 {
        return Err(Error::InvalidData);
    }

    let mut r = Reader::new(data);
    let mut metrics = Vec::with_capacity(num_glyphs);
    for _ in 0..num_long_metrics {
        let advance = r.read::<u16>().ok_or(Error::MissingData)?;
        let bearing = r.read::<i16>().ok_or(Error::MissingData)?;
        metrics.push((advance, bearing));
    }

    let last_advance = metrics.last().map_or(0, |m| m.0);
    for _ in num_long_metrics..num_glyphs {
        // Some fonts cut the bearing array short. Bearings are recomputed
        // from the outlines anyway.
        let bearing = r.read::<i16>().unwrap_or(0);
        metrics.push((last_advance, bearing));
    }

    Ok(metrics)
}

/// Write the table and return it with the number of long metrics.
///
/// With `trim`, the run of equal advances at the end is folded into the
/// last long metric.
pub(crate) fn write(advances: &[u16], bearings: &[i16], trim: bool) -> (Vec<u8>, u16) {
    let mut num_long_metrics = advances.len();
    if trim {
        if let Some(last) = advances.last() {
            while num_long_metrics > 1 && advances[num_long_metrics - 2] == *last {
                num_long_metrics -= 1;
            }
        }
    }

    let mut w = Writer::with_capacity(4 * advances.len());
    for (i, (advance, bearing)) in advances.iter().zip(bearings).enumerate() {
        if i < num_long_metrics {
            w.write::<u16>(*advance);
        }
        w.write::<i16>(*bearing);
    }

    // Glyph counts are bounded by `u16`.
    (w.finish(), num_long_metrics as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_advances_are_folded() {
        let (data, count) = write(&[500, 600, 600, 600], &[1, 2, 3, 4], true);
        assert_eq!(count, 2);
        assert_eq!(data.len(), 2 * 4 + 2 * 2);
        assert_eq!(
            parse(&data, count, 4).unwrap(),
            vec![(500, 1), (600, 2), (600, 3), (600, 4)]
        );
    }

    #[test]
    fn untrimmed_keeps_every_long_metric() {
        let (data, count) = write(&[600, 600], &[0, 0], false);
        assert_eq!(count, 2);
        assert_eq!(data.len(), 8);
    }

    #[test]
    fn no_long_metrics_is_invalid() {
        assert_eq!(parse(&[0, 0], 0, 1), Err(Error::InvalidData));
    }
}
