//! Reading timing samples from text files.
//!
//! Two line formats are understood:
//!
//! - plain: `<integer>`
//! - labeled: `<class> <integer>`, where class `0` is the fixed-input class
//!   and `1` the random-input class
//!
//! Blank lines are skipped. With a prefix, only lines starting with it are
//! read and everything else is treated as unrelated output.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SeriesSource;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unable to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}:{line}: expected {expected}, found `{content}`", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        expected: &'static str,
        content: String,
    },
    #[error("{}:{line}: unknown class label `{class}`, expected 0 or 1", .path.display())]
    UnknownClass {
        path: PathBuf,
        line: usize,
        class: String,
    },
    #[error("{} contains no samples", .path.display())]
    Empty { path: PathBuf },
}

/// Samples of a labeled file, split by class.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LabeledSamples {
    pub fixed: Vec<i64>,
    pub random: Vec<i64>,
}

impl LabeledSamples {
    pub fn len(&self) -> usize {
        self.fixed.len() + self.random.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named sample set, one line on the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub name: String,
    pub samples: Vec<i64>,
}

/// Loads the one (plain) or two (labeled) series a source describes.
pub fn load_series(source: &SeriesSource) -> Result<Vec<Series>, LoadError> {
    match source {
        SeriesSource::Plain { path, name, prefix } => {
            let samples = load_plain(path, prefix.as_deref())?;
            let name = name.clone().unwrap_or_else(|| file_stem(path));
            Ok(vec![Series { name, samples }])
        }
        SeriesSource::Labeled {
            path,
            names,
            prefix,
        } => {
            let LabeledSamples { fixed, random } = load_labeled(path, prefix.as_deref())?;
            for (name, samples) in names.iter().zip([&fixed, &random].iter()) {
                if samples.is_empty() {
                    warn!(path = %path.display(), class = %name, "no samples for class");
                }
            }
            let [fixed_name, random_name] = names.clone();
            Ok(vec![
                Series {
                    name: fixed_name,
                    samples: fixed,
                },
                Series {
                    name: random_name,
                    samples: random,
                },
            ])
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_else(|| path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

pub fn load_plain(path: &Path, prefix: Option<&str>) -> Result<Vec<i64>, LoadError> {
    let samples = parse_plain(open(path)?, path, prefix)?;
    if samples.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    debug!(path = %path.display(), samples = samples.len(), "loaded plain samples");
    Ok(samples)
}

pub fn load_labeled(path: &Path, prefix: Option<&str>) -> Result<LabeledSamples, LoadError> {
    let samples = parse_labeled(open(path)?, path, prefix)?;
    if samples.is_empty() {
        return Err(LoadError::Empty {
            path: path.to_path_buf(),
        });
    }
    debug!(
        path = %path.display(),
        fixed = samples.fixed.len(),
        random = samples.random.len(),
        "loaded labeled samples"
    );
    Ok(samples)
}

pub fn parse_plain<R: BufRead>(
    reader: R,
    path: &Path,
    prefix: Option<&str>,
) -> Result<Vec<i64>, LoadError> {
    let mut samples = Vec::new();
    for_each_record(reader, path, prefix, |line, record| {
        samples.push(parse_value(record, path, line, "an integer")?);
        Ok(())
    })?;
    Ok(samples)
}

pub fn parse_labeled<R: BufRead>(
    reader: R,
    path: &Path,
    prefix: Option<&str>,
) -> Result<LabeledSamples, LoadError> {
    const EXPECTED: &str = "`<class> <integer>`";

    let mut samples = LabeledSamples::default();
    for_each_record(reader, path, prefix, |line, record| {
        let parts = record.split_whitespace().collect::<Vec<_>>();
        if parts.len() != 2 {
            return Err(malformed(path, line, EXPECTED, record));
        }
        let value = parse_value(parts[1], path, line, EXPECTED)?;
        match parts[0] {
            "0" => samples.fixed.push(value),
            "1" => samples.random.push(value),
            class => {
                return Err(LoadError::UnknownClass {
                    path: path.to_path_buf(),
                    line,
                    class: class.to_string(),
                })
            }
        }
        Ok(())
    })?;
    Ok(samples)
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Calls `handle` with the 1-based line number and trimmed content of
/// every line that carries a record.
fn for_each_record<R, F>(
    reader: R,
    path: &Path,
    prefix: Option<&str>,
    mut handle: F,
) -> Result<(), LoadError>
where
    R: BufRead,
    F: FnMut(usize, &str) -> Result<(), LoadError>,
{
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| match source.kind() {
            io::ErrorKind::InvalidData => malformed(path, index + 1, "UTF-8 text", "<invalid UTF-8>"),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let record = match prefix {
            Some(prefix) => match line.strip_prefix(prefix) {
                Some(rest) => rest,
                None => continue,
            },
            None => line.as_str(),
        };
        let record = record.trim();
        if record.is_empty() {
            continue;
        }
        handle(index + 1, record)?;
    }
    Ok(())
}

fn parse_value(
    text: &str,
    path: &Path,
    line: usize,
    expected: &'static str,
) -> Result<i64, LoadError> {
    text.parse()
        .map_err(|_| malformed(path, line, expected, text))
}

fn malformed(path: &Path, line: usize, expected: &'static str, content: &str) -> LoadError {
    LoadError::Malformed {
        path: path.to_path_buf(),
        line,
        expected,
        content: content.to_string(),
    }
}
