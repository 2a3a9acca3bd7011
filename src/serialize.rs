use anyhow::{anyhow, Result};
use itertools::Itertools;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::log_file::{LogFile, LogLayout, RunParameters};
use crate::thermo_data::ThermoData;

const RECORD_MODULE: &str = module_path!();
const RECORD_CLASS: &str = "LogFile";

/// Serializable form of a [`LogFile`]: type tags next to the thermo series, so
/// a property can never shadow a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "@module")]
    pub module: String,
    #[serde(rename = "@class")]
    pub class: String,
    pub columns: Vec<String>,
    pub data: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug)]
pub enum RecordError {
    UnknownModule(String),
    UnknownClass(String),
    DuplicateColumn(String),
    MissingColumn(String),
    UnexpectedColumn(String),
    UnevenColumn {
        column: String,
        expected: usize,
        found: usize,
    },
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for RecordError {}

impl LogFile {
    #[must_use]
    pub fn to_record(&self) -> LogRecord {
        let data = self
            .list_properties()
            .iter()
            .filter_map(|key| Some((key.clone(), self.get_property(key)?.to_vec())))
            .collect();
        LogRecord {
            module: RECORD_MODULE.to_string(),
            class: RECORD_CLASS.to_string(),
            columns: self.list_properties().to_vec(),
            data,
        }
    }

    /// Rebuilds a log from a record. The run is assumed to print every step,
    /// since the record does not carry the `run`/`thermo` directives.
    pub fn from_record(mut record: LogRecord) -> Result<Self, RecordError> {
        if record.module != RECORD_MODULE {
            return Err(RecordError::UnknownModule(record.module));
        }
        if record.class != RECORD_CLASS {
            return Err(RecordError::UnknownClass(record.class));
        }
        if let Some(duplicate) = record.columns.iter().duplicates().next() {
            return Err(RecordError::DuplicateColumn(duplicate.clone()));
        }
        if let Some(extra) = record.data.keys().find(|key| !record.columns.contains(*key)) {
            return Err(RecordError::UnexpectedColumn(extra.clone()));
        }
        let columns = record
            .columns
            .iter()
            .map(|key| {
                record
                    .data
                    .remove(key)
                    .ok_or_else(|| RecordError::MissingColumn(key.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rows_count = columns.first().map_or(0, Vec::len);
        if let Some((key, column)) = record
            .columns
            .iter()
            .zip(&columns)
            .find(|(_, column)| column.len() != rows_count)
        {
            return Err(RecordError::UnevenColumn {
                column: key.clone(),
                expected: rows_count,
                found: column.len(),
            });
        }

        let values = DMatrix::from_iterator(rows_count, columns.len(), columns.into_iter().flatten());
        let parameters = RunParameters {
            run_steps: rows_count.saturating_sub(1) as u64,
            log_interval: 1,
            columns: record.columns,
        };
        let layout = LogLayout {
            total_lines: rows_count,
            header_lines: 0,
            data_rows: rows_count,
            footer_blank_lines: 0,
        };
        let data = ThermoData::new(parameters.columns.clone(), values);
        Ok(Self::from_parts(parameters, layout, data))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_record())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let record = serde_json::from_str::<LogRecord>(json)?;
        Self::from_record(record).map_err(|err| anyhow!(err))
    }
}
