use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;
use thiserror::Error;

use crate::histogram::{Anchor, BinRange, OutOfRange};

/// Most labels a tick step may put on the x axis.
pub const MAX_TICK_LABELS: usize = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("bin count must be at least 1")]
    NoBins,
    #[error("no series to plot; pass sample files or list them under `series`")]
    NoSeries,
    #[error("{name} {bounds} is empty or not finite")]
    InvalidBounds { name: &'static str, bounds: Bounds },
    #[error("x tick step must be positive, got {0}")]
    InvalidTick(f64),
    #[error("x tick step {tick} puts more than {} labels on {window}", MAX_TICK_LABELS)]
    TooManyTicks { tick: f64, window: Bounds },
}

/// Chart rendering of a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    /// One point per bin at its center, joined by lines.
    Line,
    /// Outline of the bars.
    Bar,
}

impl Default for Style {
    fn default() -> Self {
        Style::Line
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(Style::Line),
            "bar" => Ok(Style::Bar),
            _ => Err(format!("unknown style `{}`, expected `line` or `bar`", s)),
        }
    }
}

/// Closed numeric interval written `[lo, hi]` in YAML or `lo:hi` on the
/// command line.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bounds(pub f64, pub f64);

impl Bounds {
    fn is_valid(&self) -> bool {
        self.0.is_finite() && self.1.is_finite() && self.0 < self.1
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

impl FromStr for Bounds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.splitn(2, ':').collect::<Vec<_>>();
        if parts.len() != 2 {
            return Err("invalid range format, expected `lo:hi`".to_string());
        }
        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid range bound `{}`", part))
        };
        Ok(Bounds(parse(parts[0])?, parse(parts[1])?))
    }
}

/// Where the samples of one or two series come from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum SeriesSource {
    /// One integer per line; a single series.
    Plain {
        path: PathBuf,
        name: Option<String>,
        prefix: Option<String>,
    },
    /// `<class> <integer>` per line; one series per class.
    Labeled {
        path: PathBuf,
        #[serde(default = "default_class_names")]
        names: [String; 2],
        prefix: Option<String>,
    },
}

impl SeriesSource {
    pub fn path(&self) -> &Path {
        match self {
            SeriesSource::Plain { path, .. } | SeriesSource::Labeled { path, .. } => path,
        }
    }
}

pub fn default_class_names() -> [String; 2] {
    ["fix".to_string(), "random".to_string()]
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bins: usize,
    /// Bin range; the sample minimum and maximum when unset.
    pub range: Option<Bounds>,
    pub out_of_range: OutOfRange,
    pub style: Style,
    /// Bin position of line points.
    pub anchor: Anchor,
    /// Visible part of the x axis.
    pub x_window: Option<Bounds>,
    pub x_tick: Option<f64>,
    pub series: Vec<SeriesSource>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        PlotConfig {
            title: "timing-hist".to_string(),
            x_label: "cycle".to_string(),
            y_label: "frequency".to_string(),
            bins: 100,
            range: None,
            out_of_range: OutOfRange::default(),
            style: Style::default(),
            anchor: Anchor::default(),
            x_window: None,
            x_tick: None,
            series: Vec::new(),
        }
    }
}

impl PlotConfig {
    pub fn from_file(path: &Path) -> Result<PlotConfig, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bins == 0 {
            return Err(ConfigError::NoBins);
        }
        if self.series.is_empty() {
            return Err(ConfigError::NoSeries);
        }
        for (name, bounds) in [("range", self.range), ("x window", self.x_window)].iter() {
            if let Some(bounds) = bounds {
                if !bounds.is_valid() {
                    return Err(ConfigError::InvalidBounds {
                        name: *name,
                        bounds: *bounds,
                    });
                }
            }
        }
        match (self.x_tick, self.x_window) {
            (Some(tick), _) if !(tick.is_finite() && tick > 0.) => {
                Err(ConfigError::InvalidTick(tick))
            }
            (Some(tick), Some(window)) if (window.1 - window.0) / tick >= MAX_TICK_LABELS as f64 => {
                Err(ConfigError::TooManyTicks { tick, window })
            }
            _ => Ok(()),
        }
    }

    pub fn bin_range(&self) -> BinRange {
        match self.range {
            Some(Bounds(lower, upper)) => BinRange::Explicit { lower, upper },
            None => BinRange::FromData,
        }
    }
}
