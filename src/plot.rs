//! Turning loaded series into something a chart can draw.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::{
    config::{Bounds, PlotConfig, Style, MAX_TICK_LABELS},
    histogram::{BinRange, Histogram},
    samples::Series,
    stats::Stats,
};

/// Number of labels on an axis without a configured tick step.
const DEFAULT_LABELS: usize = 5;

#[derive(Debug)]
pub struct PlotSeries {
    pub name: String,
    pub histogram: Histogram,
    pub stats: Stats,
    pub points: Vec<(f64, f64)>,
}

impl PlotSeries {
    pub fn summary(&self) -> String {
        format!(
            "{}: n={} min={} max={} mean={:.1} sd={:.1} bin={:.2} peak={}",
            self.name,
            self.stats.count,
            self.stats.min,
            self.stats.max,
            self.stats.mean,
            self.stats.std_dev,
            self.histogram.width(),
            self.histogram.max_count(),
        )
    }
}

#[derive(Debug)]
pub struct Plot {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
    pub series: Vec<PlotSeries>,
}

impl Plot {
    pub fn build(config: &PlotConfig, series: Vec<Series>) -> Result<Plot> {
        let range = shared_range(config, &series);
        let mut plotted = Vec::with_capacity(series.len());

        for Series { name, samples } in series {
            let stats = match Stats::compute(&samples) {
                Some(stats) => stats,
                None => {
                    warn!(series = %name, "series has no samples, skipping");
                    continue;
                }
            };
            let histogram = Histogram::compute(&samples, config.bins, range, config.out_of_range)
                .with_context(|| format!("unable to bin series `{}`", name))?;
            let (lower, upper) = histogram.range();
            let outside = samples
                .iter()
                .filter(|&&s| (s as f64) < lower || (s as f64) > upper)
                .count();
            if outside > 0 {
                warn!(series = %name, samples = outside, "clamped samples outside the bin range");
            }
            debug!(
                series = %name,
                width = histogram.width(),
                total = histogram.total(),
                filled = histogram.counts().iter().filter(|&&count| count > 0).count(),
                "binned"
            );

            let points = match config.style {
                Style::Line => histogram
                    .points(config.anchor)
                    .into_iter()
                    .map(|(x, count)| (x, count as f64))
                    .collect(),
                Style::Bar => histogram.step_points(),
            };
            plotted.push(PlotSeries {
                name,
                histogram,
                stats,
                points,
            });
        }

        if plotted.is_empty() {
            anyhow::bail!("none of the series contain samples");
        }

        let (x_bounds, x_labels) = x_axis(config, &plotted);
        let peak = plotted
            .iter()
            .map(|series| series.histogram.max_count())
            .max()
            .unwrap_or(0);
        let (y_bounds, y_labels) = count_axis(peak);

        Ok(Plot {
            title: config.title.clone(),
            x_label: config.x_label.clone(),
            y_label: config.y_label.clone(),
            x_bounds,
            y_bounds,
            x_labels,
            y_labels,
            series: plotted,
        })
    }

    pub fn summary(&self) -> Vec<String> {
        self.series.iter().map(PlotSeries::summary).collect()
    }
}

/// All series share one set of bins so they can be compared.
fn shared_range(config: &PlotConfig, series: &[Series]) -> BinRange {
    if config.range.is_some() {
        return config.bin_range();
    }
    let all = series.iter().flat_map(|series| series.samples.iter().copied());
    match (all.clone().min(), all.max()) {
        (Some(min), Some(max)) if (min as f64) < (max as f64) => BinRange::Explicit {
            lower: min as f64,
            upper: max as f64,
        },
        _ => BinRange::FromData,
    }
}

fn x_axis(config: &PlotConfig, series: &[PlotSeries]) -> ([f64; 2], Vec<String>) {
    let bounds = match config.x_window {
        Some(Bounds(lower, upper)) => [lower, upper],
        None => {
            let lower = series
                .iter()
                .map(|series| series.histogram.range().0)
                .fold(f64::INFINITY, f64::min);
            let upper = series
                .iter()
                .map(|series| series.histogram.range().1)
                .fold(f64::NEG_INFINITY, f64::max);
            [lower, upper]
        }
    };

    match config.x_tick {
        Some(tick) => tick_axis(bounds, tick),
        None => (bounds, even_labels(bounds, DEFAULT_LABELS)),
    }
}

/// Widens `bounds` to whole multiples of `tick` and labels every tick.
///
/// Chart labels are spread evenly over the axis, so the bounds have to
/// line up with the ticks for the labels to sit at their values. Falls back to evenly spaced labels when the step would need more than
/// `MAX_TICK_LABELS` of them.
fn tick_axis(bounds: [f64; 2], tick: f64) -> ([f64; 2], Vec<String>) {
    let first = (bounds[0] / tick).floor();
    let last = (bounds[1] / tick).ceil().max(first + 1.);
    let steps = last - first;
    if !(steps >= 1. && steps < MAX_TICK_LABELS as f64) {
        warn!(tick, steps, "too many x axis ticks, spacing labels evenly");
        return (bounds, even_labels(bounds, DEFAULT_LABELS));
    }
    let labels = (0..=steps as usize)
        .map(|i| format_value((first + i as f64) * tick))
        .collect();
    ([first * tick, last * tick], labels)
}

/// Whole-number count axis from zero to at least `peak`.
fn count_axis(peak: u64) -> ([f64; 2], Vec<String>) {
    let peak = peak.max(1);
    let intervals = (DEFAULT_LABELS as u64 - 1).min(peak);
    let step = (peak + intervals - 1) / intervals;
    let top = step * intervals;
    let labels = (0..=intervals).map(|i| (i * step).to_string()).collect();
    ([0., top as f64], labels)
}

fn even_labels(bounds: [f64; 2], count: usize) -> Vec<String> {
    let step = (bounds[1] - bounds[0]) / (count - 1) as f64;
    (0..count)
        .map(|i| format_value(bounds[0] + i as f64 * step))
        .collect()
}

fn format_value(value: f64) -> String {
    if value.fract() == 0. {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::{Anchor, OutOfRange};

    fn series(name: &str, samples: Vec<i64>) -> Series {
        Series {
            name: name.to_string(),
            samples,
        }
    }

    #[test]
    fn series_share_bins_from_combined_range() {
        let config = PlotConfig {
            bins: 4,
            ..PlotConfig::default()
        };
        let plot = Plot::build(
            &config,
            vec![series("fix", vec![0, 1, 1]), series("random", vec![6, 8])],
        )
        .unwrap();
        assert_eq!(plot.series[0].histogram.range(), (0., 8.));
        assert_eq!(plot.series[1].histogram.range(), (0., 8.));
        assert_eq!(plot.series[0].histogram.counts(), &[3, 0, 0, 0]);
        assert_eq!(plot.series[1].histogram.counts(), &[0, 0, 0, 2]);
        assert_eq!(plot.x_bounds, [0., 8.]);
        assert_eq!(plot.x_labels, vec!["0", "2", "4", "6", "8"]);
        assert_eq!(plot.y_bounds, [0., 3.]);
    }

    #[test]
    fn line_style_plots_bin_centers() {
        let config = PlotConfig {
            bins: 2,
            range: Some(Bounds(0., 10.)),
            ..PlotConfig::default()
        };
        let plot = Plot::build(&config, vec![series("a", vec![1, 2, 7])]).unwrap();
        assert_eq!(plot.series[0].points, vec![(2.5, 2.), (7.5, 1.)]);

        let config = PlotConfig {
            anchor: Anchor::LowerEdge,
            ..config
        };
        let plot = Plot::build(&config, vec![series("a", vec![1, 2, 7])]).unwrap();
        assert_eq!(plot.series[0].points, vec![(0., 2.), (5., 1.)]);
    }

    #[test]
    fn bar_style_plots_outline() {
        let config = PlotConfig {
            bins: 2,
            range: Some(Bounds(0., 10.)),
            style: Style::Bar,
            ..PlotConfig::default()
        };
        let plot = Plot::build(&config, vec![series("a", vec![1, 2, 7])]).unwrap();
        assert_eq!(plot.series[0].points.len(), 6);
        assert_eq!(plot.series[0].points[1], (0., 2.));
    }

    #[test]
    fn x_window_with_ticks() {
        let config = PlotConfig {
            range: Some(Bounds(0., 2000.)),
            x_window: Some(Bounds(0., 800.)),
            x_tick: Some(50.),
            ..PlotConfig::default()
        };
        let plot = Plot::build(&config, vec![series("q_insert_head", vec![90, 120, 4000])]).unwrap();
        assert_eq!(plot.x_bounds, [0., 800.]);
        assert_eq!(plot.x_labels.len(), 17);
        assert_eq!(plot.x_labels[1], "50");
        // clamped into the last bin
        assert_eq!(plot.series[0].histogram.counts()[99], 1);
    }

    #[test]
    fn tick_axis_widens_to_whole_ticks() {
        let (bounds, labels) = tick_axis([12., 97.], 25.);
        assert_eq!(bounds, [0., 100.]);
        assert_eq!(labels, vec!["0", "25", "50", "75", "100"]);
    }

    #[test]
    fn tick_axis_limits_label_count() {
        let (bounds, labels) = tick_axis([0., 5_000_000.], 50.);
        assert_eq!(bounds, [0., 5_000_000.]);
        assert_eq!(labels.len(), DEFAULT_LABELS);

        let (bounds, labels) = tick_axis([1e19, 2e19], 1.);
        assert_eq!(bounds, [1e19, 2e19]);
        assert_eq!(labels.len(), DEFAULT_LABELS);
    }

    #[test]
    fn count_axis_uses_whole_numbers() {
        assert_eq!(count_axis(3), ([0., 3.], vec!["0".to_string(), "1".into(), "2".into(), "3".into()]));
        assert_eq!(count_axis(0), ([0., 1.], vec!["0".to_string(), "1".into()]));
        let (bounds, labels) = count_axis(101);
        assert_eq!(bounds, [0., 104.]);
        assert_eq!(labels, vec!["0", "26", "52", "78", "104"]);
    }

    #[test]
    fn huge_samples_equal_as_floats_still_plot() {
        let base = 1i64 << 60;
        let plot = Plot::build(&PlotConfig::default(), vec![series("a", vec![base, base + 1])]).unwrap();
        assert_eq!(plot.series[0].histogram.total(), 2);
    }

    #[test]
    fn reject_policy_names_the_series() {
        let config = PlotConfig {
            range: Some(Bounds(0., 100.)),
            out_of_range: OutOfRange::Reject,
            ..PlotConfig::default()
        };
        let err = Plot::build(&config, vec![series("q_remove_head", vec![5, 500])]).unwrap_err();
        assert_eq!(err.to_string(), "unable to bin series `q_remove_head`");
    }

    #[test]
    fn empty_series_are_skipped() {
        let config = PlotConfig::default();
        let plot = Plot::build(
            &config,
            vec![series("fix", vec![]), series("random", vec![3, 4])],
        )
        .unwrap();
        assert_eq!(plot.series.len(), 1);
        assert_eq!(plot.series[0].name, "random");

        assert!(Plot::build(&config, vec![series("fix", vec![])]).is_err());
    }

    #[test]
    fn summary_lists_every_series() {
        let config = PlotConfig {
            bins: 2,
            ..PlotConfig::default()
        };
        let plot = Plot::build(&config, vec![series("a", vec![2, 4])]).unwrap();
        assert_eq!(
            plot.summary(),
            vec!["a: n=2 min=2 max=4 mean=3.0 sd=1.0 bin=1.00 peak=1"]
        );
    }
}
