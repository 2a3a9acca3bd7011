use std::collections::HashMap;
use std::fmt;

use nalgebra::DMatrix;

use crate::math::IteratorAvg;

/// Thermo output of a single run, stored column-major: one column per property.
pub struct ThermoData {
    rows_count: usize,
    keys: HashMap<String, usize>,
    columns: Vec<String>,
    values: DMatrix<f64>,
    averages: Vec<f64>,
}

impl ThermoData {
    /// `values` must have one column per entry of `columns`; keys are assumed unique.
    pub(crate) fn new(columns: Vec<String>, values: DMatrix<f64>) -> Self {
        assert_eq!(columns.len(), values.ncols());
        let keys = columns
            .iter()
            .enumerate()
            .map(|(j, key)| (key.clone(), j))
            .collect();
        let averages = values
            .column_iter()
            .map(|column| column.iter().copied().avg().unwrap_or(f64::NAN))
            .collect();
        Self {
            rows_count: values.nrows(),
            keys,
            columns,
            values,
            averages,
        }
    }

    pub fn rows_count(&self) -> usize {
        self.rows_count
    }

    pub fn get_keys(&self) -> &[String] {
        &self.columns
    }

    pub fn get_property_index(&self, key: &str) -> Option<usize> {
        self.keys.get(key).copied()
    }

    pub fn get_property(&self, key: &str) -> Option<&[f64]> {
        let start = self.get_property_index(key)? * self.rows_count;
        let end = start + self.rows_count;
        Some(&self.values.as_slice()[start..end])
    }

    pub fn get_average(&self, key: &str) -> Option<f64> {
        self.get_property_index(key).map(|j| self.averages[j])
    }

    pub fn averages(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.averages.iter().copied())
    }

    pub fn std_deviations(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns.iter().map(String::as_str).zip(
            self.values
                .column_iter()
                .map(|column| column.iter().copied().std().unwrap_or(f64::NAN)),
        )
    }

    #[inline]
    pub fn get_value(&self, row: usize, key: &str) -> Option<f64> {
        let j = self.get_property_index(key)?;
        self.values.get((row, j)).copied()
    }
}

impl fmt::Debug for ThermoData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThermoData")
            .field("rows_count", &self.rows_count)
            .field("columns", &self.columns)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::assert_f64_near;

    fn sample() -> ThermoData {
        let values = DMatrix::from_row_slice(
            3,
            2,
            &[
                0.0, 300.0, //
                10.0, 310.0, //
                20.0, 320.0,
            ],
        );
        ThermoData::new(vec!["step".into(), "temp".into()], values)
    }

    #[test]
    fn test_columns_are_contiguous() {
        let data = sample();
        assert_eq!(data.rows_count(), 3);
        assert_eq!(data.get_keys(), ["step", "temp"]);
        assert_eq!(data.get_property("step"), Some(&[0.0, 10.0, 20.0][..]));
        assert_eq!(data.get_property("temp"), Some(&[300.0, 310.0, 320.0][..]));
        assert_eq!(data.get_property("press"), None);
        assert_eq!(data.get_value(1, "temp"), Some(310.0));
        assert_eq!(data.get_value(3, "temp"), None);
    }

    #[test]
    fn test_averages() {
        let data = sample();
        assert_f64_near!(data.get_average("step").unwrap(), 10.0);
        assert_f64_near!(data.get_average("temp").unwrap(), 310.0);
        let keys = data.averages().map(|(key, _)| key).collect::<Vec<_>>();
        assert_eq!(keys, ["step", "temp"]);
        let (_, std) = data.std_deviations().nth(1).unwrap();
        assert_f64_near!(std, 8.16496580927726);
    }
}
