mod directive;
mod log_file;
mod math;
mod serialize;
mod thermo_data;

pub use directive::Directive;
pub use log_file::{LogFile, LogLayout, LogParsingError, RunParameters};
pub use math::IteratorAvg;
pub use serialize::{LogRecord, RecordError};
pub use thermo_data::ThermoData;
