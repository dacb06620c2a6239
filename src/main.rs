mod config;
mod histogram;
mod logging;
mod plot;
mod samples;
mod stats;
mod tui;

use anyhow::{Context, Result};
use argh::FromArgs;
use std::path::PathBuf;
use tracing::info;

use crate::{
    config::{default_class_names, Bounds, PlotConfig, SeriesSource, Style},
    histogram::OutOfRange,
    plot::Plot,
    tui::Tui,
};

#[derive(FromArgs, Debug)]
/// Histograms of timing samples
struct Args {
    /// sample files, one integer per line (`<class> <integer>` with --labeled)
    #[argh(positional)]
    files: Vec<PathBuf>,

    /// path to YAML plot configuration
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// number of bins
    #[argh(option, short = 'b')]
    bins: Option<usize>,

    /// bin range as `lo:hi`, defaults to the sample minimum and maximum
    #[argh(option, short = 'r')]
    range: Option<Bounds>,

    /// visible part of the x axis as `lo:hi`
    #[argh(option, short = 'x')]
    x_window: Option<Bounds>,

    /// spacing of x axis labels
    #[argh(option)]
    x_tick: Option<f64>,

    /// split files into fixed (class 0) and random (class 1) series
    #[argh(switch, short = 'l')]
    labeled: bool,

    /// only read lines starting with this prefix, e.g. "dut "
    #[argh(option, short = 'p')]
    prefix: Option<String>,

    /// chart style, `line` or `bar`
    #[argh(option, short = 's')]
    style: Option<Style>,

    /// fail on samples outside the bin range instead of clamping them
    #[argh(switch)]
    reject_out_of_range: bool,

    /// x axis title
    #[argh(option)]
    x_label: Option<String>,

    /// y axis title
    #[argh(option)]
    y_label: Option<String>,

    /// chart title
    #[argh(option, short = 't')]
    title: Option<String>,

    /// print per-series statistics instead of opening the chart
    #[argh(switch)]
    no_tui: bool,

    /// log debug events to stderr
    #[argh(switch, short = 'v')]
    verbose: bool,
}

/// Config file values, overridden by whatever was given on the command line.
fn resolve_config(args: Args) -> Result<PlotConfig> {
    let mut config = match &args.config {
        Some(path) => PlotConfig::from_file(path)?,
        None => PlotConfig::default(),
    };

    if let Some(bins) = args.bins {
        config.bins = bins;
    }
    if args.range.is_some() {
        config.range = args.range;
    }
    if args.x_window.is_some() {
        config.x_window = args.x_window;
    }
    if args.x_tick.is_some() {
        config.x_tick = args.x_tick;
    }
    if let Some(style) = args.style {
        config.style = style;
    }
    if args.reject_out_of_range {
        config.out_of_range = OutOfRange::Reject;
    }
    if let Some(x_label) = args.x_label {
        config.x_label = x_label;
    }
    if let Some(y_label) = args.y_label {
        config.y_label = y_label;
    }
    if let Some(title) = args.title {
        config.title = title;
    }

    let labeled = args.labeled;
    let prefix = args.prefix;
    config
        .series
        .extend(args.files.into_iter().map(|path| match labeled {
            true => SeriesSource::Labeled {
                path,
                names: default_class_names(),
                prefix: prefix.clone(),
            },
            false => SeriesSource::Plain {
                path,
                name: None,
                prefix: prefix.clone(),
            },
        }));

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    logging::init(args.verbose).context("unable to initialize logging")?;
    let no_tui = args.no_tui;
    let config = resolve_config(args)?;
    info!(
        bins = config.bins,
        range = ?config.range,
        policy = ?config.out_of_range,
        series = config.series.len(),
        "resolved plot configuration"
    );

    let mut series = Vec::new();
    for source in &config.series {
        series.extend(crate::samples::load_series(source)?);
    }
    let plot = Plot::build(&config, series)?;

    if no_tui {
        for line in plot.summary() {
            println!("{}", line);
        }
        return Ok(());
    }
    Tui::new()?.run(&plot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::histogram::BinRange;

    fn args(list: &[&str]) -> Args {
        Args::from_args(&["timing-hist"], list).unwrap()
    }

    #[test]
    fn files_become_plain_series() {
        let config = resolve_config(args(&["a.txt", "b.txt", "-b", "50", "-r", "0:2000"])).unwrap();
        assert_eq!(config.bins, 50);
        assert_eq!(
            config.bin_range(),
            BinRange::Explicit {
                lower: 0.,
                upper: 2000.
            }
        );
        assert_eq!(config.series.len(), 2);
        assert_eq!(
            config.series[1],
            SeriesSource::Plain {
                path: PathBuf::from("b.txt"),
                name: None,
                prefix: None,
            }
        );
    }

    #[test]
    fn labeled_files_keep_prefix() {
        let config = resolve_config(args(&[
            "out",
            "--labeled",
            "--prefix",
            "dut ",
            "--style",
            "bar",
            "--reject-out-of-range",
            "--x-label",
            "cycles",
            "--y-label",
            "times",
        ]))
        .unwrap();
        assert_eq!(
            config.series,
            vec![SeriesSource::Labeled {
                path: PathBuf::from("out"),
                names: default_class_names(),
                prefix: Some("dut ".to_string()),
            }]
        );
        assert_eq!(config.style, Style::Bar);
        assert_eq!(config.out_of_range, OutOfRange::Reject);
        assert_eq!(config.x_label, "cycles");
        assert_eq!(config.y_label, "times");
    }

    #[test]
    fn command_line_overrides_config_file() {
        let path = std::env::temp_dir().join(format!("timing-hist-{}.yaml", std::process::id()));
        std::fs::write(
            &path,
            "bins: 100\nx_tick: 50\nx_window: [0, 800]\nseries:\n  - format: plain\n    path: a.txt\n",
        )
        .unwrap();
        let config = resolve_config(args(&[
            "-c",
            path.to_str().unwrap(),
            "-b",
            "20",
            "b.txt",
        ]))
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.bins, 20);
        assert_eq!(config.x_tick, Some(50.));
        assert_eq!(config.x_window, Some(Bounds(0., 800.)));
        assert_eq!(config.series.len(), 2);
        assert_eq!(config.series[0].path(), std::path::Path::new("a.txt"));
        assert_eq!(config.series[1].path(), std::path::Path::new("b.txt"));
    }

    #[test]
    fn nothing_to_plot_is_an_error() {
        let err = resolve_config(args(&[])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NoSeries)
        ));
    }

    #[test]
    fn bad_range_is_rejected_by_argh() {
        assert!(Args::from_args(&["timing-hist"], &["a.txt", "-r", "2000"]).is_err());
    }
}
