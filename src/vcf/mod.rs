//! Plain-text VCF reading.
//!
//! Only the columns the annotator needs are split out: the five leading positional
//! columns plus INFO, FORMAT and the first sample.

mod reader;
mod record;

pub use reader::{ReaderStats, VcfReader};
pub use record::{parse_info, zip_format_sample, VariantRecord};
