//! Number format types

/// Number format for cell display
///
/// Mirrors the typed patterns hosted sheets accept: the variant carries the
/// format type and the string carries the pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Numeric pattern, e.g. `#,##0`
    Number(String),

    /// Percentage pattern, e.g. `0.0%`
    Percent(String),

    /// Date pattern, e.g. `dd-mmm-yyyy`
    Date(String),
}

impl NumberFormat {
    /// Number with thousands separator (#,##0)
    pub fn thousands() -> Self {
        NumberFormat::Number("#,##0".to_string())
    }

    /// Number with thousands separator and one decimal (#,##0.0)
    pub fn thousands_one_decimal() -> Self {
        NumberFormat::Number("#,##0.0".to_string())
    }

    /// Percentage with one decimal (0.0%)
    pub fn percent_one_decimal() -> Self {
        NumberFormat::Percent("0.0%".to_string())
    }

    /// Day-month-year date (dd-mmm-yyyy)
    pub fn long_date() -> Self {
        NumberFormat::Date("dd-mmm-yyyy".to_string())
    }

    /// Get the format pattern
    pub fn pattern(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::Number(s) | NumberFormat::Percent(s) | NumberFormat::Date(s) => s,
        }
    }

    /// Get the format type name as used by hosted sheet APIs
    pub fn type_name(&self) -> &'static str {
        match self {
            NumberFormat::General => "NUMBER_FORMAT_TYPE_UNSPECIFIED",
            NumberFormat::Number(_) => "NUMBER",
            NumberFormat::Percent(_) => "PERCENT",
            NumberFormat::Date(_) => "DATE",
        }
    }

    /// Check if this is a date format
    pub fn is_date_format(&self) -> bool {
        matches!(self, NumberFormat::Date(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns() {
        assert_eq!(NumberFormat::thousands().pattern(), "#,##0");
        assert_eq!(NumberFormat::percent_one_decimal().pattern(), "0.0%");
        assert_eq!(NumberFormat::long_date().type_name(), "DATE");
        assert!(NumberFormat::long_date().is_date_format());
        assert!(!NumberFormat::General.is_date_format());
    }
}
