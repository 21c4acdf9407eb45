//! Column typing and value coercion
//!
//! CSV headers carry an optional type suffix (`age:int`, `lat:double`). The
//! suffix is resolved once per column into a [`ColumnType`]; cells are then
//! coerced by the column instead of re-inspecting the header per cell.

use crate::PropertyValue;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Invalid {expected} value '{value}' in column '{column}'")]
pub struct ValueError {
    pub column: String,
    pub value: String,
    pub expected: &'static str,
}

/// Target type of a column, resolved from its header suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Double,
    Text,
}

/// A typed CSV column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    /// Resolve a `name[:type]` header. Unrecognized suffixes fall back to
    /// text, but the suffix is still stripped from the property name.
    pub fn parse(header: &str) -> Self {
        let (name, suffix) = match header.split_once(':') {
            Some((name, suffix)) => (name, Some(suffix)),
            None => (header, None),
        };
        let column_type = match suffix {
            Some("int") => ColumnType::Int,
            Some("double") => ColumnType::Double,
            _ => ColumnType::Text,
        };
        Self {
            name: name.trim().to_string(),
            column_type,
        }
    }

    /// Coerce a raw cell into this column's type.
    ///
    /// Callers filter empty cells out before coercion; an empty cell means
    /// the property is omitted, never coerced.
    pub fn coerce(&self, raw: &str) -> Result<PropertyValue, ValueError> {
        match self.column_type {
            ColumnType::Int => raw
                .parse::<i64>()
                .map(PropertyValue::Int)
                .map_err(|_| self.error(raw, "integer")),
            ColumnType::Double => raw
                .parse::<f64>()
                .map(PropertyValue::Float)
                .map_err(|_| self.error(raw, "floating-point")),
            ColumnType::Text => Ok(PropertyValue::Text(raw.to_string())),
        }
    }

    fn error(&self, raw: &str, expected: &'static str) -> ValueError {
        ValueError {
            column: self.name.clone(),
            value: raw.to_string(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_suffix_parses_integer() {
        let column = Column::parse("age:int");
        assert_eq!(column.name, "age");
        assert_eq!(column.column_type, ColumnType::Int);
        assert_eq!(column.coerce("42").unwrap(), PropertyValue::Int(42));
    }

    #[test]
    fn double_suffix_parses_float() {
        let column = Column::parse("lat:double");
        assert_eq!(column.coerce("3.5").unwrap(), PropertyValue::Float(3.5));
    }

    #[test]
    fn bare_header_stays_text() {
        let column = Column::parse("code");
        assert_eq!(column.name, "code");
        assert_eq!(
            column.coerce("JFK").unwrap(),
            PropertyValue::Text("JFK".to_string())
        );
    }

    #[test]
    fn unknown_suffix_falls_back_to_text() {
        let column = Column::parse("desc:string");
        assert_eq!(column.name, "desc");
        assert_eq!(column.column_type, ColumnType::Text);
        assert_eq!(
            column.coerce("John F. Kennedy").unwrap(),
            PropertyValue::Text("John F. Kennedy".to_string())
        );
    }

    #[test]
    fn non_numeric_under_int_suffix_errors() {
        let column = Column::parse("elev:int");
        let err = column.coerce("high").unwrap_err();
        assert_eq!(err.column, "elev");
        assert_eq!(err.value, "high");
    }

    #[test]
    fn negative_and_fractional_values() {
        assert_eq!(
            Column::parse("elev:int").coerce("-14").unwrap(),
            PropertyValue::Int(-14)
        );
        assert_eq!(
            Column::parse("lon:double").coerce("-73.7789").unwrap(),
            PropertyValue::Float(-73.7789)
        );
    }
}
