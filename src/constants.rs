//! Application constants for the IV curve processor
//!
//! Tokens and keys of the tracer export format, timestamp layouts,
//! analysis defaults and output file names used throughout the crate.

// =============================================================================
// Tracer Export Format
// =============================================================================

/// Token the tracer writes when a measurement was not taken
pub const MISSING_VALUE_TOKEN: &str = "-------";

/// Byte-order mark as decoded from UTF-8
pub const UTF8_BOM: char = '\u{feff}';

/// UTF-8 byte-order mark mis-decoded as Latin-1
pub const MOJIBAKE_BOM: &str = "ï»¿";

/// Leading field of a sample boundary line
pub const SAMPLE_BOUNDARY_TOKEN: &str = "Sample No.";

/// Curve column headers as written by the tracer
pub const VOLTAGE_COLUMN: &str = "V (V)";
pub const CURRENT_COLUMN: &str = "I (A)";
pub const POWER_COLUMN: &str = "P (W)";

/// Leading fields that open a curve table (matched exactly, case-insensitive)
pub const CURVE_HEADER_LEADERS: &[&str] = &[VOLTAGE_COLUMN, "V"];

/// Fields that name a curve column and therefore never start a metadata pair
pub const CURVE_COLUMN_TOKENS: &[&str] = &[
    VOLTAGE_COLUMN,
    CURRENT_COLUMN,
    POWER_COLUMN,
    "V",
    "I",
    "P",
];

/// Metadata keys written by the tracer
pub mod metadata_keys {
    pub const SAMPLE_NO: &str = "Sample No.";
    pub const DATE_TIME: &str = "Date & Time";
    pub const VOPEN: &str = "Vopen (V)";
    pub const ISHORT: &str = "Ishort (A)";
    pub const PMAX: &str = "Pmax (W)";
    pub const VMAXP: &str = "Vmaxp (V)";
    pub const IMAXP: &str = "Imaxp (A)";

    /// Alternative spellings seen in hand-edited exports
    pub const VMAX_ALIASES: &[&str] = &[VMAXP, "Vmax (V)"];
    pub const IMAX_ALIASES: &[&str] = &[IMAXP, "Imax (A)"];
}

// =============================================================================
// Timestamps
// =============================================================================

/// Date-time layouts accepted for tracer and logger timestamps, tried in order
pub const DATETIME_FORMATS: &[&str] = &[
    "%d-%m-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Date-only layouts, interpreted as midnight
pub const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%Y-%m-%d"];

/// Layout used when writing timestamps to output tables
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Calibration Dataset
// =============================================================================

pub mod calibration_columns {
    pub const VOLTAGE_CALIB: &str = "Voltage_Calib";
    pub const CURRENT_CALIB: &str = "Current_Calib";
    pub const VOLTAGE_UNCALIB: &str = "Voltage_Uncalib";
    pub const CURRENT_UNCALIB: &str = "Current_Uncalib";
}

// =============================================================================
// Temperature Logger
// =============================================================================

pub mod logger_columns {
    pub const DATE: &str = "Date:";
    pub const TIME: &str = "Time:";
    pub const TIMESTAMP: &str = "Timestamp";
    pub const CHANNEL_PREFIX: &str = "Channel - ";
}

// =============================================================================
// Output Files
// =============================================================================

pub const PARAMETERS_FILE: &str = "parameters.csv";
pub const VOPEN_FILE: &str = "vopen.csv";
pub const VMAX_FILE: &str = "vmax.csv";
pub const IMAX_FILE: &str = "imax.csv";
pub const PMAX_FILE: &str = "pmax.csv";

/// Extension of tracer exports picked up when walking directories
pub const TRACER_FILE_EXTENSION: &str = "csv";
