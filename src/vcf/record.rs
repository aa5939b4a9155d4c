use crate::constants::{
    ALLELE_FREQUENCY_KEY, FORMAT_COLUMN, INFO_COLUMN, MIN_LEADING_COLUMNS, MIN_SAMPLE_COLUMNS,
    MISSING_ID, MISSING_VALUE, READ_DEPTH_KEY, SAMPLE_COLUMN,
};
use crate::error::{AnnotatorError, Result};
use std::collections::HashMap;

/// One retained data line of a VCF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    /// 1-based line number in the source file
    pub line: usize,
    pub chromosome: String,
    pub position: String,
    pub identifier: String,
    pub reference: String,
    pub alternate: String,
    pub info: String,
    pub format: String,
    pub sample: String,
}

impl VariantRecord {
    /// Split a data line into a record.
    ///
    /// Returns `Ok(None)` when the identifier column holds the missing marker (`.`).
    /// The identifier check happens before the sample columns are required, so an
    /// unidentified short line is dropped rather than reported.
    pub fn parse_line(line: usize, text: &str) -> Result<Option<Self>> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() < MIN_LEADING_COLUMNS {
            return Err(AnnotatorError::MalformedLine {
                line,
                reason: format!(
                    "expected at least {} columns, found {}",
                    MIN_LEADING_COLUMNS,
                    fields.len()
                ),
            });
        }

        if fields[2] == MISSING_ID {
            return Ok(None);
        }

        if fields.len() < MIN_SAMPLE_COLUMNS {
            return Err(AnnotatorError::MalformedLine {
                line,
                reason: format!(
                    "expected at least {} columns (INFO, FORMAT and one sample), found {}",
                    MIN_SAMPLE_COLUMNS,
                    fields.len()
                ),
            });
        }

        Ok(Some(Self {
            line,
            chromosome: fields[0].to_string(),
            position: fields[1].to_string(),
            identifier: fields[2].to_string(),
            reference: fields[3].to_string(),
            alternate: fields[4].to_string(),
            info: fields[INFO_COLUMN].to_string(),
            format: fields[FORMAT_COLUMN].to_string(),
            sample: fields[SAMPLE_COLUMN].to_string(),
        }))
    }

    pub fn info_map(&self) -> HashMap<&str, &str> {
        parse_info(&self.info)
    }

    pub fn sample_map(&self) -> HashMap<&str, &str> {
        zip_format_sample(&self.format, &self.sample)
    }

    /// Raw INFO `AF` value, `-` when absent.
    pub fn variant_rate(&self) -> String {
        self.info_map()
            .get(ALLELE_FREQUENCY_KEY)
            .map_or_else(|| MISSING_VALUE.to_string(), |v| v.to_string())
    }

    /// INFO `DP` value, `-` when absent.
    pub fn read_depth_info(&self) -> String {
        self.info_map()
            .get(READ_DEPTH_KEY)
            .map_or_else(|| MISSING_VALUE.to_string(), |v| v.to_string())
    }

    /// Per-sample `DP` value, `-` when absent.
    pub fn read_depth_format(&self) -> String {
        self.sample_map()
            .get(READ_DEPTH_KEY)
            .map_or_else(|| MISSING_VALUE.to_string(), |v| v.to_string())
    }

    /// Alternate length minus reference length: negative for deletions, positive for insertions.
    pub fn variant_length(&self) -> i64 {
        self.alternate.len() as i64 - self.reference.len() as i64
    }
}

/// Parse a `key=value;key=value` INFO column. Flags without `=` are ignored.
pub fn parse_info(info: &str) -> HashMap<&str, &str> {
    info.split(';')
        .filter_map(|entry| entry.split_once('='))
        .collect()
}

/// Pair FORMAT keys with the sample's values positionally.
pub fn zip_format_sample<'a>(format: &'a str, sample: &'a str) -> HashMap<&'a str, &'a str> {
    format.split(':').zip(sample.split(':')).collect()
}
