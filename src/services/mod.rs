pub mod csv_export;
pub mod result_sink;
pub mod validator;

pub use csv_export::CsvExport;
pub use result_sink::{FallbackReason, ResultSink, SinkOutcome};
