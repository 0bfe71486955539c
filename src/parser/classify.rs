//! Line classification for tracer exports
//!
//! Every line is classified exactly once into a small closed set of kinds.
//! The parser's state machine then consumes the kinds without re-inspecting
//! the raw text.

use regex::Regex;
use std::sync::LazyLock;

use crate::constants::{
    CURVE_COLUMN_TOKENS, CURVE_HEADER_LEADERS, MOJIBAKE_BOM, SAMPLE_BOUNDARY_TOKEN, UTF8_BOM,
};
use crate::models::CellValue;

/// Loose boundary pattern: `Sample` followed by separators and digits
static FALLBACK_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*"?\s*Sample[\s,:\-"]*(\d+)"#).expect("fallback boundary pattern is valid")
});

/// How sample boundaries are recognized across a whole file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMode {
    /// Leading field is exactly `Sample No.`
    Primary,
    /// Line starts with `Sample` plus digits
    Fallback,
}

/// Kind of a single line
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    Blank,
    Boundary { sample_no: Option<String> },
    MetadataPair { key: String, value: Option<String> },
    CurveHeader { columns: Vec<String> },
    CurveRow { cells: Vec<CellValue> },
    Unrecognized,
}

/// Classifies lines under a fixed boundary mode and missing-value token
#[derive(Debug, Clone)]
pub struct LineClassifier<'a> {
    mode: BoundaryMode,
    missing_value: &'a str,
}

impl<'a> LineClassifier<'a> {
    pub fn new(mode: BoundaryMode, missing_value: &'a str) -> Self {
        Self {
            mode,
            missing_value,
        }
    }

    pub fn classify(&self, raw: &str) -> LineKind {
        let line = strip_bom(raw).trim();
        if line.is_empty() {
            return LineKind::Blank;
        }

        let fields = split_fields(line);
        if fields.iter().all(|f| f.is_empty()) {
            return LineKind::Blank;
        }

        if let Some(kind) = self.boundary(line, &fields) {
            return kind;
        }

        if fields.len() >= 2 && is_one_of(&fields[0], CURVE_HEADER_LEADERS) {
            let mut columns = fields;
            while columns.last().is_some_and(|c| c.is_empty()) {
                columns.pop();
            }
            return LineKind::CurveHeader { columns };
        }

        if is_metadata_pair(&fields) {
            let mut fields = fields.into_iter();
            let key = fields.next().unwrap_or_default();
            let value = fields.next().and_then(|v| self.normalize(v));
            return LineKind::MetadataPair { key, value };
        }

        if fields.len() >= 2 {
            return LineKind::CurveRow {
                cells: self.cells(&fields),
            };
        }

        LineKind::Unrecognized
    }

    /// Read a line as curve cells regardless of how it classifies on its own
    pub fn row_cells(&self, raw: &str) -> Vec<CellValue> {
        self.cells(&split_fields(strip_bom(raw).trim()))
    }

    fn cells(&self, fields: &[String]) -> Vec<CellValue> {
        fields.iter().map(|f| self.coerce(f)).collect()
    }

    fn boundary(&self, line: &str, fields: &[String]) -> Option<LineKind> {
        match self.mode {
            BoundaryMode::Primary => fields[0]
                .eq_ignore_ascii_case(SAMPLE_BOUNDARY_TOKEN)
                .then(|| LineKind::Boundary {
                    sample_no: fields
                        .get(1)
                        .filter(|v| !v.is_empty())
                        .cloned()
                        .and_then(|v| self.normalize(v)),
                }),
            BoundaryMode::Fallback => {
                FALLBACK_BOUNDARY
                    .captures(line)
                    .map(|captures| LineKind::Boundary {
                        sample_no: captures.get(1).map(|m| m.as_str().to_string()),
                    })
            }
        }
    }

    /// Missing-value token to `None`; an empty value stays present
    fn normalize(&self, value: String) -> Option<String> {
        if value == self.missing_value {
            None
        } else {
            Some(value)
        }
    }

    /// Best-effort numeric coercion of a curve cell
    fn coerce(&self, field: &str) -> CellValue {
        if field.is_empty() {
            CellValue::Empty
        } else if field == self.missing_value {
            CellValue::Missing
        } else {
            match field.parse::<f64>() {
                Ok(value) => CellValue::Number(value),
                Err(_) => CellValue::Text(field.to_string()),
            }
        }
    }
}

/// Remove byte-order marks, including the Latin-1 mis-decoding of one
pub fn strip_bom(line: &str) -> &str {
    let mut line = line;
    loop {
        if let Some(rest) = line.strip_prefix(UTF8_BOM) {
            line = rest;
        } else if let Some(rest) = line.strip_prefix(MOJIBAKE_BOM) {
            line = rest;
        } else {
            return line;
        }
    }
}

/// Split a line into trimmed, unquoted fields.
///
/// The delimiter is a tab when the line contains one, otherwise a comma.
/// Delimiters inside double quotes do not split; `""` inside quotes is a
/// literal quote. Empty fields are kept, so `a,,b,` has four.
pub fn split_fields(line: &str) -> Vec<String> {
    let delimiter = if line.contains('\t') { '\t' } else { ',' };
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => fields.push(std::mem::take(&mut field)),
            c => field.push(c),
        }
    }
    fields.push(field);

    fields.into_iter().map(|f| f.trim().to_string()).collect()
}

/// A named key, one value (possibly empty) and nothing after it but empty
/// trailing fields
fn is_metadata_pair(fields: &[String]) -> bool {
    fields.len() >= 2
        && !fields[0].is_empty()
        && !is_one_of(&fields[0], CURVE_COLUMN_TOKENS)
        && fields[0].parse::<f64>().is_err()
        && fields[2..].iter().all(|f| f.is_empty())
}

fn is_one_of(field: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|token| field.eq_ignore_ascii_case(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary() -> LineClassifier<'static> {
        LineClassifier::new(BoundaryMode::Primary, "-------")
    }

    #[test]
    fn test_split_fields_comma_and_tab() {
        assert_eq!(split_fields(r#""a","b""#), vec!["a", "b"]);
        assert_eq!(split_fields("a\tb\t c "), vec!["a", "b", "c"]);
        assert_eq!(split_fields(r#""a, b",c"#), vec!["a, b", "c"]);
        assert_eq!(split_fields(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
        assert_eq!(split_fields("a,,b,"), vec!["a", "", "b", ""]);
        assert_eq!(split_fields(r#""x","""#), vec!["x", ""]);
    }

    #[test]
    fn test_strip_bom_variants() {
        assert_eq!(strip_bom("\u{feff}\"Sample No.\""), "\"Sample No.\"");
        assert_eq!(strip_bom("ï»¿x"), "x");
        assert_eq!(strip_bom("plain"), "plain");
    }

    #[test]
    fn test_boundary_with_bom_and_tabs() {
        let c = primary();
        assert_eq!(
            c.classify("\u{feff}\"Sample No.\",\"12\""),
            LineKind::Boundary {
                sample_no: Some("12".to_string())
            }
        );
        assert_eq!(
            c.classify("Sample No.\t7"),
            LineKind::Boundary {
                sample_no: Some("7".to_string())
            }
        );
        assert_eq!(
            c.classify("sample no.,3"),
            LineKind::Boundary {
                sample_no: Some("3".to_string())
            }
        );
    }

    #[test]
    fn test_fallback_boundary() {
        let c = LineClassifier::new(BoundaryMode::Fallback, "-------");
        assert_eq!(
            c.classify("Sample 42"),
            LineKind::Boundary {
                sample_no: Some("42".to_string())
            }
        );
        assert_eq!(
            c.classify("\"Sample: 5\",\"x\""),
            LineKind::Boundary {
                sample_no: Some("5".to_string())
            }
        );
        assert!(matches!(
            c.classify("\"Sample Temp\",\"25\""),
            LineKind::MetadataPair { .. }
        ));
    }

    #[test]
    fn test_metadata_sentinel_is_absent() {
        assert_eq!(
            primary().classify(r#""Pmax (W)","-------""#),
            LineKind::MetadataPair {
                key: "Pmax (W)".to_string(),
                value: None
            }
        );
    }

    #[test]
    fn test_header_requires_exact_leading_field() {
        assert!(matches!(
            primary().classify(r#""V (V)","I (A)","P (W)""#),
            LineKind::CurveHeader { .. }
        ));
        assert!(matches!(
            primary().classify("V,I"),
            LineKind::CurveHeader { .. }
        ));
        assert_eq!(
            primary().classify(r#""Max V (V) seen","3.2""#),
            LineKind::MetadataPair {
                key: "Max V (V) seen".to_string(),
                value: Some("3.2".to_string())
            }
        );
    }

    #[test]
    fn test_numeric_pairs_are_curve_rows() {
        assert_eq!(
            primary().classify("0.5,-------"),
            LineKind::CurveRow {
                cells: vec![CellValue::Number(0.5), CellValue::Missing]
            }
        );
        assert_eq!(
            primary().classify("1.0\t2.0\tbad"),
            LineKind::CurveRow {
                cells: vec![
                    CellValue::Number(1.0),
                    CellValue::Number(2.0),
                    CellValue::Text("bad".to_string())
                ]
            }
        );
    }

    #[test]
    fn test_empty_fields_keep_their_position() {
        let c = primary();
        assert_eq!(
            c.classify(r#""Comment","""#),
            LineKind::MetadataPair {
                key: "Comment".to_string(),
                value: Some(String::new())
            }
        );
        assert_eq!(
            c.classify(r#""Vopen (V)","21.5",,"#),
            LineKind::MetadataPair {
                key: "Vopen (V)".to_string(),
                value: Some("21.5".to_string())
            }
        );
        assert_eq!(
            c.classify("0.0,1.0,"),
            LineKind::CurveRow {
                cells: vec![CellValue::Number(0.0), CellValue::Number(1.0), CellValue::Empty]
            }
        );
        assert_eq!(
            c.classify(r#""V (V)","I (A)","#),
            LineKind::CurveHeader {
                columns: vec!["V (V)".to_string(), "I (A)".to_string()]
            }
        );
    }

    #[test]
    fn test_row_cells_ignore_metadata_shape() {
        assert_eq!(
            primary().row_cells("-------,0.5"),
            vec![CellValue::Missing, CellValue::Number(0.5)]
        );
        assert_eq!(
            primary().row_cells(r#""n/a",0.3"#),
            vec![CellValue::Text("n/a".to_string()), CellValue::Number(0.3)]
        );
    }

    #[test]
    fn test_blank_and_unrecognized() {
        assert_eq!(primary().classify("   "), LineKind::Blank);
        assert_eq!(primary().classify(",,"), LineKind::Blank);
        assert_eq!(primary().classify("just text"), LineKind::Unrecognized);
    }
}
