use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, warn};
use nalgebra::DMatrix;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::directive::{parse_row, Directive, LogLine};
use crate::thermo_data::ThermoData;

#[derive(Debug)]
pub enum LogParsingError {
    MissingDirective(Directive),
    DuplicateColumn(String),
    MalformedNumericRow {
        line: usize,
        token: String,
    },
    ColumnCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },
    RowCountMismatch {
        expected: usize,
        available: usize,
    },
    RowCountOverflow {
        run_steps: u64,
        log_interval: u64,
    },
    EmptyFile,
    IO(io::Error),
}

impl std::fmt::Display for LogParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDirective(directive) => {
                write!(f, "missing `{directive}` directive before thermo data")
            }
            Self::DuplicateColumn(name) => {
                write!(f, "column `{name}` declared twice by thermo_style")
            }
            Self::MalformedNumericRow { line, token } => {
                write!(f, "line {line}: invalid float literal `{token}` in thermo data")
            }
            Self::ColumnCountMismatch {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {line}: expected {expected} thermo columns, found {found}"
            ),
            Self::RowCountMismatch {
                expected,
                available,
            } => write!(
                f,
                "expected {expected} thermo rows, {available} available"
            ),
            Self::RowCountOverflow {
                run_steps,
                log_interval,
            } => write!(
                f,
                "`run {run_steps}` with `thermo {log_interval}` exceeds the addressable row count"
            ),
            Self::EmptyFile => write!(f, "log file is empty"),
            Self::IO(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for LogParsingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IO(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for LogParsingError {
    fn from(err: io::Error) -> Self {
        Self::IO(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParameters {
    pub run_steps: u64,
    pub log_interval: u64,
    pub columns: Vec<String>,
}

impl RunParameters {
    /// Number of thermo rows printed by a run: the initial state, one row per
    /// interval, and the final step when it does not fall on an interval.
    /// An interval of zero prints only the first and last step.
    /// `None` when the count does not fit in `usize`.
    #[must_use]
    pub fn expected_rows(&self) -> Option<usize> {
        let samples = match (self.run_steps, self.log_interval) {
            (0, _) => 0,
            (_, 0) => 1,
            (steps, interval) => steps.div_ceil(interval),
        };
        usize::try_from(samples).ok()?.checked_add(1)
    }
}

/// Line counts of the regions of a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLayout {
    pub total_lines: usize,
    pub header_lines: usize,
    pub data_rows: usize,
    pub footer_blank_lines: usize,
}

impl LogLayout {
    /// Non-blank lines after the thermo data.
    #[must_use]
    pub fn skip_footer(&self) -> usize {
        self.total_lines - self.header_lines - self.data_rows - self.footer_blank_lines
    }
}

#[derive(Default)]
struct HeaderScan {
    run_steps: Option<u64>,
    log_interval: Option<u64>,
    columns: Option<Vec<String>>,
}

impl HeaderScan {
    fn visit(&mut self, line: &LogLine) {
        match line {
            LogLine::Run(steps) => match self.run_steps {
                None => {
                    debug!("run: {steps}");
                    self.run_steps = Some(*steps);
                }
                Some(first) => warn!("ignoring `run {steps}`, keeping `run {first}`"),
            },
            LogLine::Thermo(interval) => {
                debug!("thermo: {interval}");
                self.log_interval = Some(*interval);
            }
            LogLine::ThermoStyle(columns) => {
                debug!("thermo_style custom: {columns:?}");
                self.columns = Some(columns.iter().map(|s| s.to_string()).collect());
            }
            _ => {}
        }
    }

    fn in_run(&self) -> bool {
        self.run_steps.is_some()
    }

    fn finish(self) -> Result<RunParameters, LogParsingError> {
        let run_steps = self
            .run_steps
            .ok_or(LogParsingError::MissingDirective(Directive::Run))?;
        let log_interval = self
            .log_interval
            .ok_or(LogParsingError::MissingDirective(Directive::Thermo))?;
        let columns = self
            .columns
            .filter(|columns| !columns.is_empty())
            .ok_or(LogParsingError::MissingDirective(Directive::ThermoStyle))?;
        if let Some(duplicate) = columns.iter().duplicates().next() {
            return Err(LogParsingError::DuplicateColumn(duplicate.clone()));
        }
        Ok(RunParameters {
            run_steps,
            log_interval,
            columns,
        })
    }
}

/// Thermo output of a LAMMPS log file.
pub struct LogFile {
    parameters: RunParameters,
    layout: LogLayout,
    data: ThermoData,
}

impl LogFile {
    pub(crate) fn from_parts(parameters: RunParameters, layout: LogLayout, data: ThermoData) -> Self {
        Self {
            parameters,
            layout,
            data,
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).context(format!("Reading {}", path.to_string_lossy()))?;
        Self::from_reader(BufReader::new(file))
            .context(format!("Parsing {}", path.to_string_lossy()))
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self, LogParsingError> {
        let lines = reader.lines().collect::<io::Result<Vec<String>>>()?;
        Self::parse(&lines)
    }

    fn parse(lines: &[String]) -> Result<Self, LogParsingError> {
        if lines.is_empty() {
            return Err(LogParsingError::EmptyFile);
        }

        let mut scan = HeaderScan::default();
        let header_lines = lines
            .iter()
            .position(|line| {
                let line = LogLine::classify(line);
                scan.visit(&line);
                matches!(line, LogLine::Numeric(_)) && scan.in_run()
            })
            .unwrap_or(lines.len());
        let parameters = scan.finish()?;
        let footer_blank_lines = lines
            .iter()
            .skip(header_lines + 1)
            .filter(|line| line.is_empty())
            .count();

        let overflow = || LogParsingError::RowCountOverflow {
            run_steps: parameters.run_steps,
            log_interval: parameters.log_interval,
        };
        let expected = parameters.expected_rows().ok_or_else(overflow)?;
        let end = header_lines.checked_add(expected).ok_or_else(overflow)?;
        let values = read_rows(lines, header_lines, end, parameters.columns.len())?;
        let available = values.nrows()
            + count_trailing_rows(&lines[header_lines + values.nrows()..], values.ncols());
        if available != expected {
            return Err(LogParsingError::RowCountMismatch {
                expected,
                available,
            });
        }

        let layout = LogLayout {
            total_lines: lines.len(),
            header_lines,
            data_rows: expected,
            footer_blank_lines,
        };
        debug!("layout: {layout:?}, skip_footer: {}", layout.skip_footer());

        let data = ThermoData::new(parameters.columns.clone(), values);
        Ok(Self::from_parts(parameters, layout, data))
    }

    #[must_use]
    pub fn run_parameters(&self) -> &RunParameters {
        &self.parameters
    }

    #[must_use]
    pub fn layout(&self) -> &LogLayout {
        &self.layout
    }

    #[must_use]
    pub fn data(&self) -> &ThermoData {
        &self.data
    }

    /// Property names in the order declared by `thermo_style custom`.
    #[must_use]
    pub fn list_properties(&self) -> &[String] {
        self.data.get_keys()
    }

    #[inline]
    #[must_use]
    pub fn get_property(&self, key: &str) -> Option<&[f64]> {
        self.data.get_property(key)
    }

    #[inline]
    #[must_use]
    pub fn get_average(&self, key: &str) -> Option<f64> {
        self.data.get_average(key)
    }
}

/// Loads lines `[first, end)` into a matrix. Loading stops early at a line that
/// does not start with a number, unless thermo rows resume after it before the
/// next blank line.
fn read_rows(
    lines: &[String],
    first: usize,
    end: usize,
    columns: usize,
) -> Result<DMatrix<f64>, LogParsingError> {
    let end = end.min(lines.len());
    let mut values = Vec::with_capacity((end - first) * columns);
    let mut rows_count = 0;
    for i in first..end {
        let line = i + 1;
        let tokens = lines[i].split_whitespace().collect::<Vec<_>>();
        match tokens.first() {
            Some(token) if token.parse::<f64>().is_ok() => {}
            _ if !rows_resume(&lines[i + 1..], columns) => break,
            Some(token) => {
                return Err(LogParsingError::MalformedNumericRow {
                    line,
                    token: token.to_string(),
                })
            }
            None => {
                return Err(LogParsingError::ColumnCountMismatch {
                    line,
                    expected: columns,
                    found: 0,
                })
            }
        }
        let row = parse_row(&tokens).map_err(|token| LogParsingError::MalformedNumericRow {
            line,
            token: token.to_string(),
        })?;
        if row.len() != columns {
            return Err(LogParsingError::ColumnCountMismatch {
                line,
                expected: columns,
                found: row.len(),
            });
        }
        values.extend(row);
        rows_count += 1;
    }
    Ok(DMatrix::from_row_slice(rows_count, columns, &values))
}

fn rows_resume(lines: &[String], columns: usize) -> bool {
    lines
        .iter()
        .take_while(|line| !line.is_empty())
        .any(|line| matches!(LogLine::classify(line), LogLine::Numeric(row) if row.len() == columns))
}

fn count_trailing_rows(lines: &[String], columns: usize) -> usize {
    lines
        .iter()
        .map(|line| LogLine::classify(line))
        .take_while(|line| matches!(line, LogLine::Numeric(row) if row.len() == columns))
        .count()
}
