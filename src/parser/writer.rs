//! Tracer-format sample writer
//!
//! Writes samples back out in the layout the tracer exports, so split files
//! open in the same tools and parse again with [`super::SampleParser`].

use std::io::Write;

use crate::constants::UTF8_BOM;
use crate::error::Result;
use crate::models::{CellValue, Sample};

/// Write samples with a leading UTF-8 byte-order mark.
///
/// Each sample becomes quoted `"key","value"` metadata lines, then the quoted
/// curve header and its rows when a curve is present, then a blank line.
/// Absent values are written as `missing_value`.
pub fn write_samples<W: Write>(writer: &mut W, samples: &[Sample], missing_value: &str) -> Result<()> {
    write!(writer, "{}", UTF8_BOM)?;
    for sample in samples {
        write_sample(writer, sample, missing_value)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_sample<W: Write>(writer: &mut W, sample: &Sample, missing_value: &str) -> Result<()> {
    for (key, value) in sample.metadata.iter() {
        writeln!(
            writer,
            "{},{}",
            quote(key),
            quote(value.unwrap_or(missing_value))
        )?;
    }

    if let Some(curve) = &sample.curve {
        let header: Vec<String> = curve.columns.iter().map(|c| quote(c)).collect();
        writeln!(writer, "{}", header.join(","))?;

        for row in &curve.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| match cell {
                    CellValue::Number(value) => value.to_string(),
                    CellValue::Text(text) => quote(text),
                    CellValue::Missing => missing_value.to_string(),
                    CellValue::Empty => String::new(),
                })
                .collect();
            writeln!(writer, "{}", cells.join(","))?;
        }
    }

    writeln!(writer)?;
    Ok(())
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
