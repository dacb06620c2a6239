use serde::Deserialize;
use thiserror::Error;

/// What to do with a sample that falls outside an explicit bin range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRange {
    /// Count it in the first (below) or last (above) bin.
    Clamp,
    /// Fail the whole computation.
    Reject,
}

impl Default for OutOfRange {
    fn default() -> Self {
        OutOfRange::Clamp
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinRange {
    /// Span the sample minimum to the sample maximum.
    FromData,
    Explicit { lower: f64, upper: f64 },
}

/// Where a bin is placed on the x axis when it is turned into a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Center,
    LowerEdge,
}

impl Default for Anchor {
    fn default() -> Self {
        Anchor::Center
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BinError {
    #[error("bin count must be at least 1")]
    NoBins,
    #[error("cannot derive a bin range from an empty sample set")]
    Empty,
    #[error("invalid bin range [{lower}, {upper}]")]
    InvalidRange { lower: f64, upper: f64 },
    #[error("sample {value} lies outside the bin range [{lower}, {upper}]")]
    OutOfRange { value: i64, lower: f64, upper: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

impl Bin {
    pub fn center(&self) -> f64 {
        (self.lower + self.upper) / 2.
    }
}

/// Fixed-width histogram over `[lower, upper]`.
///
/// Every bin is half-open except the last one, which also holds samples
/// equal to `upper`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    lower: f64,
    upper: f64,
    counts: Vec<u64>,
}

impl Histogram {
    pub fn compute(
        samples: &[i64],
        bins: usize,
        range: BinRange,
        policy: OutOfRange,
    ) -> Result<Histogram, BinError> {
        if bins == 0 {
            return Err(BinError::NoBins);
        }
        let (lower, upper) = resolve_range(samples, range)?;
        let span = upper - lower;
        let mut counts = vec![0u64; bins];

        for &sample in samples {
            let value = sample as f64;
            let index = if value < lower {
                match policy {
                    OutOfRange::Clamp => 0,
                    OutOfRange::Reject => {
                        return Err(BinError::OutOfRange {
                            value: sample,
                            lower,
                            upper,
                        })
                    }
                }
            } else if value > upper {
                match policy {
                    OutOfRange::Clamp => bins - 1,
                    OutOfRange::Reject => {
                        return Err(BinError::OutOfRange {
                            value: sample,
                            lower,
                            upper,
                        })
                    }
                }
            } else {
                // scaling before dividing keeps integer edges exact
                let index = ((value - lower) * bins as f64 / span) as usize;
                index.min(bins - 1)
            };
            counts[index] += 1;
        }

        Ok(Histogram {
            lower,
            upper,
            counts,
        })
    }

    pub fn range(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    pub fn width(&self) -> f64 {
        (self.upper - self.lower) / self.counts.len() as f64
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn bins(&self) -> impl Iterator<Item = Bin> + '_ {
        let width = self.width();
        let last = self.counts.len() - 1;
        self.counts.iter().enumerate().map(move |(i, &count)| Bin {
            lower: self.lower + i as f64 * width,
            upper: if i == last {
                self.upper
            } else {
                self.lower + (i + 1) as f64 * width
            },
            count,
        })
    }

    /// `(position, count)` per bin, ready for a line plot.
    pub fn points(&self, anchor: Anchor) -> Vec<(f64, u64)> {
        self.bins()
            .map(|bin| match anchor {
                Anchor::Center => (bin.center(), bin.count),
                Anchor::LowerEdge => (bin.lower, bin.count),
            })
            .collect()
    }

    /// Outline of the bars: both edges of each bin at its height, closed
    /// down to zero at either end.
    pub fn step_points(&self) -> Vec<(f64, f64)> {
        let mut points = Vec::with_capacity(self.counts.len() * 2 + 2);
        points.push((self.lower, 0.));
        for bin in self.bins() {
            points.push((bin.lower, bin.count as f64));
            points.push((bin.upper, bin.count as f64));
        }
        points.push((self.upper, 0.));
        points
    }
}

fn resolve_range(samples: &[i64], range: BinRange) -> Result<(f64, f64), BinError> {
    match range {
        BinRange::Explicit { lower, upper } => {
            if !lower.is_finite() || !upper.is_finite() || lower >= upper {
                return Err(BinError::InvalidRange { lower, upper });
            }
            Ok((lower, upper))
        }
        BinRange::FromData => {
            let min = *samples.iter().min().ok_or(BinError::Empty)? as f64;
            let max = *samples.iter().max().ok_or(BinError::Empty)? as f64;
            // distinct samples above 2^53 can still meet as floats
            if min == max {
                Ok(widen(min))
            } else {
                Ok((min, max))
            }
        }
    }
}

/// Smallest range around `value` that is not empty as `f64`.
fn widen(value: f64) -> (f64, f64) {
    let pad = (value.abs() * f64::EPSILON).max(0.5);
    (value - pad, value + pad)
}
