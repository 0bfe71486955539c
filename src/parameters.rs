//! Photovoltaic performance parameter extraction.
//!
//! Derives open-circuit voltage, short-circuit current, the maximum-power
//! point and the fill factor for each sample. Values reported by the tracer
//! in the sample metadata win; anything missing there is reduced from the
//! curve table. Extraction never fails: a parameter available from neither
//! source is simply absent.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::constants::{
    DATE_FORMATS, DATETIME_FORMATS, IMAX_FILE, OUTPUT_TIMESTAMP_FORMAT, PMAX_FILE, VMAX_FILE,
    VOPEN_FILE, metadata_keys,
};
use crate::error::Result;
use crate::models::{CurvePoint, OperatingPoints, ParameterRecord, Sample};

/// Fractional seconds following a `HH:MM:SS` time
static FRACTIONAL_SECONDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2}:\d{2}:\d{2})\.\d+").expect("fractional seconds pattern is valid")
});

/// Derive the parameter record of one sample
pub fn extract_parameters(sample: &Sample) -> ParameterRecord {
    let metadata = &sample.metadata;
    let reported = |keys: &[&str]| metadata.get_any(keys).and_then(parse_number);

    let mut voc = reported(&[metadata_keys::VOPEN]);
    let mut isc = reported(&[metadata_keys::ISHORT]);
    let mut pmax = reported(&[metadata_keys::PMAX]);
    let mut vmax = reported(metadata_keys::VMAX_ALIASES);
    let mut imax = reported(metadata_keys::IMAX_ALIASES);

    if [voc, isc, pmax, vmax, imax].iter().any(Option::is_none) {
        let points = sample.points();
        if !points.is_empty() {
            let reduced = reduce_curve(&points);
            voc = voc.or(reduced.voc);
            isc = isc.or(reduced.isc);
            pmax = pmax.or(reduced.pmax);
            vmax = vmax.or(reduced.vmax);
            imax = imax.or(reduced.imax);
        }
    }

    let date_time = sample.date_time().map(str::to_string);
    let timestamp = date_time.as_deref().and_then(parse_timestamp);
    if date_time.is_some() && timestamp.is_none() {
        debug!(
            "Sample {:?} in {}: unparseable date {:?}",
            sample.sample_no(),
            sample.source_file,
            date_time
        );
    }

    ParameterRecord {
        source_file: sample.source_file.clone(),
        sample_id: sample.sample_no().map(str::to_string),
        date_time,
        timestamp,
        voc,
        isc,
        pmax,
        vmax,
        imax,
        fill_factor: fill_factor(pmax, voc, isc),
    }
}

/// Derive the parameter records of several samples in order
pub fn extract_all(samples: &[Sample]) -> Vec<ParameterRecord> {
    samples.iter().map(extract_parameters).collect()
}

/// Reduce curve triples to their characteristic operating points.
///
/// VOC is the voltage where current is closest to zero when the curve
/// crosses zero current (a row at exactly zero, or a sign change between
/// consecutive rows), otherwise the highest voltage. ISC is the current at
/// the voltage closest to zero. The maximum-power point is the row with the
/// largest power. Non-finite values are ignored.
pub fn reduce_curve(points: &[CurvePoint]) -> OperatingPoints {
    let vi: Vec<&CurvePoint> = points
        .iter()
        .filter(|p| p.voltage.is_finite() && p.current.is_finite())
        .collect();

    let crosses_zero = vi.iter().any(|p| p.current == 0.0)
        || vi
            .windows(2)
            .any(|pair| pair[0].current.signum() != pair[1].current.signum());

    let voc = if crosses_zero {
        first_min_by_key(&vi, |p| p.current.abs()).map(|p| p.voltage)
    } else {
        vi.iter().map(|p| p.voltage).reduce(f64::max)
    };

    let isc = first_min_by_key(&vi, |p| p.voltage.abs()).map(|p| p.current);

    let mpp = points
        .iter()
        .filter(|p| p.power.is_finite())
        .fold(None::<&CurvePoint>, |best, p| match best {
            Some(b) if b.power >= p.power => Some(b),
            _ => Some(p),
        });

    OperatingPoints {
        voc,
        isc,
        pmax: mpp.map(|p| p.power),
        vmax: mpp.map(|p| p.voltage).filter(|v| v.is_finite()),
        imax: mpp.map(|p| p.current).filter(|c| c.is_finite()),
    }
}

/// `pmax / (voc * isc)`, absent when an operand is absent or the
/// denominator is zero or not finite
pub fn fill_factor(pmax: Option<f64>, voc: Option<f64>, isc: Option<f64>) -> Option<f64> {
    let denominator = voc? * isc?;
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }
    Some(pmax? / denominator).filter(|ff| ff.is_finite())
}

/// Parse a tracer or logger timestamp.
///
/// Fractional seconds are dropped first. Date-only values are taken as
/// midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let cleaned = FRACTIONAL_SECONDS.replace(raw.trim(), "$1");
    let text = cleaned.as_ref();

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn first_min_by_key<'a>(
    points: &[&'a CurvePoint],
    key: impl Fn(&CurvePoint) -> f64,
) -> Option<&'a CurvePoint> {
    points
        .iter()
        .copied()
        .fold(None::<&CurvePoint>, |best, p| match best {
            Some(b) if key(b) <= key(p) => Some(b),
            _ => Some(p),
        })
}

/// A parameter exported as its own table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Vopen,
    Vmax,
    Imax,
    Pmax,
}

impl Parameter {
    pub const ALL: [Parameter; 4] = [
        Parameter::Vopen,
        Parameter::Vmax,
        Parameter::Imax,
        Parameter::Pmax,
    ];

    /// Value column header
    pub fn column(&self) -> &'static str {
        match self {
            Parameter::Vopen => "Vopen (V)",
            Parameter::Vmax => "Vmax (V)",
            Parameter::Imax => "Imax (A)",
            Parameter::Pmax => "Pmax (W)",
        }
    }

    /// Output file name of the table
    pub fn file_name(&self) -> &'static str {
        match self {
            Parameter::Vopen => VOPEN_FILE,
            Parameter::Vmax => VMAX_FILE,
            Parameter::Imax => IMAX_FILE,
            Parameter::Pmax => PMAX_FILE,
        }
    }

    pub fn value(&self, record: &ParameterRecord) -> Option<f64> {
        match self {
            Parameter::Vopen => record.voc,
            Parameter::Vmax => record.vmax,
            Parameter::Imax => record.imax,
            Parameter::Pmax => record.pmax,
        }
    }
}

/// Table of all parameter records, one row per sample
pub fn parameters_frame(records: &[ParameterRecord]) -> Result<DataFrame> {
    let text = |f: fn(&ParameterRecord) -> Option<String>| -> Vec<Option<String>> {
        records.iter().map(f).collect()
    };
    let numbers = |f: fn(&ParameterRecord) -> Option<f64>| -> Vec<Option<f64>> {
        records.iter().map(f).collect()
    };

    let columns = vec![
        Column::new(
            "Source File".into(),
            text(|r| Some(r.source_file.clone())),
        ),
        Column::new("Sample No.".into(), text(|r| r.sample_id.clone())),
        Column::new("Date & Time".into(), text(|r| r.date_time.clone())),
        Column::new(
            "Timestamp".into(),
            text(|r| {
                r.timestamp
                    .map(|ts| ts.format(OUTPUT_TIMESTAMP_FORMAT).to_string())
            }),
        ),
        Column::new("Voc (V)".into(), numbers(|r| r.voc)),
        Column::new("Isc (A)".into(), numbers(|r| r.isc)),
        Column::new("Pmax (W)".into(), numbers(|r| r.pmax)),
        Column::new("Vmax (V)".into(), numbers(|r| r.vmax)),
        Column::new("Imax (A)".into(), numbers(|r| r.imax)),
        Column::new("Fill Factor".into(), numbers(|r| r.fill_factor)),
    ];

    Ok(DataFrame::new(columns)?)
}

/// Table of one parameter, restricted to the samples where it is present
pub fn parameter_frame(records: &[ParameterRecord], parameter: Parameter) -> Result<DataFrame> {
    let present: Vec<(&ParameterRecord, f64)> = records
        .iter()
        .filter_map(|r| parameter.value(r).map(|value| (r, value)))
        .collect();

    let source: Vec<String> = present.iter().map(|(r, _)| r.source_file.clone()).collect();
    let sample: Vec<Option<String>> = present.iter().map(|(r, _)| r.sample_id.clone()).collect();
    let date: Vec<Option<String>> = present.iter().map(|(r, _)| r.date_time.clone()).collect();
    let values: Vec<f64> = present.iter().map(|(_, value)| *value).collect();

    Ok(DataFrame::new(vec![
        Column::new("Source File".into(), source),
        Column::new("Sample No.".into(), sample),
        Column::new("Date & Time".into(), date),
        Column::new(parameter.column().into(), values),
    ])?)
}
