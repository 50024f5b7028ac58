//! Part identity: record types, store keys and formatted part numbers

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Distance between two consecutive assembly numbers within a project
pub const ASSEMBLY_STRIDE: u32 = 100;

/// Maximum length of a project prefix
pub const MAX_PREFIX_LEN: usize = 10;

/// Kind of record held in the parts table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartType {
    /// Groups child parts and sub-assemblies; numbered on multiples of 100
    Assembly,
    /// Manufacturable item; numbered inside its parent assembly's block
    Part,
}

impl PartType {
    /// Get the string representation stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            PartType::Assembly => "assembly",
            PartType::Part => "part",
        }
    }

    /// Single-letter indicator used in formatted part numbers
    pub fn indicator(&self) -> char {
        match self {
            PartType::Assembly => 'A',
            PartType::Part => 'P',
        }
    }

    /// Inverse of [`PartType::indicator`]
    pub fn from_indicator(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(PartType::Assembly),
            'P' => Some(PartType::Part),
            _ => None,
        }
    }

    /// Get all part types
    pub fn all() -> &'static [PartType] {
        &[PartType::Assembly, PartType::Part]
    }
}

impl fmt::Display for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PartType {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "assembly" => Ok(PartType::Assembly),
            "part" => Ok(PartType::Part),
            _ => Err(IdParseError::InvalidType(s.to_string())),
        }
    }
}

impl ToSql for PartType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PartType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        s.parse()
            .map_err(|e: IdParseError| rusqlite::types::FromSqlError::Other(Box::new(e)))
    }
}

macro_rules! store_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Raw store key
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s.trim().trim_start_matches('#');
                digits
                    .parse::<i64>()
                    .map($name)
                    .map_err(|_| IdParseError::InvalidKey(s.to_string()))
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value.as_i64().map($name)
            }
        }
    };
}

store_key!(
    /// Store-assigned key of a part or assembly record
    PartId
);

store_key!(
    /// Store-assigned key of a project record
    ProjectId
);

/// Validate a project prefix (1-10 ASCII alphanumeric characters)
pub fn validate_prefix(prefix: &str) -> Result<(), IdParseError> {
    let valid = !prefix.is_empty()
        && prefix.len() <= MAX_PREFIX_LEN
        && prefix.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(IdParseError::InvalidPrefix(prefix.to_string()))
    }
}

/// A formatted, human-readable part number such as `BP25-A-0100`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartNumber {
    prefix: String,
    part_type: PartType,
    numeric_id: u32,
}

impl PartNumber {
    /// Build a part number from its components
    pub fn new(prefix: impl Into<String>, part_type: PartType, numeric_id: u32) -> Self {
        Self {
            prefix: prefix.into(),
            part_type,
            numeric_id,
        }
    }

    /// Project prefix component
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Type encoded by the indicator letter
    pub fn part_type(&self) -> PartType {
        self.part_type
    }

    /// Numeric component
    pub fn numeric_id(&self) -> u32 {
        self.numeric_id
    }

    /// Parse a part number from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl fmt::Display for PartNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:04}",
            self.prefix,
            self.part_type.indicator(),
            self.numeric_id
        )
    }
}

impl FromStr for PartNumber {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut pieces = s.rsplitn(3, '-');
        let (Some(digits), Some(indicator), Some(prefix)) =
            (pieces.next(), pieces.next(), pieces.next())
        else {
            return Err(IdParseError::MissingDelimiter(s.to_string()));
        };

        validate_prefix(prefix)?;

        let mut chars = indicator.chars();
        let part_type = match (chars.next(), chars.next()) {
            (Some(c), None) => PartType::from_indicator(c),
            _ => None,
        }
        .ok_or_else(|| IdParseError::InvalidIndicator(indicator.to_string()))?;

        if digits.len() < 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(IdParseError::InvalidNumber(digits.to_string()));
        }
        let numeric_id = digits
            .parse()
            .map_err(|_| IdParseError::InvalidNumber(digits.to_string()))?;

        Ok(Self::new(prefix, part_type, numeric_id))
    }
}

impl Serialize for PartNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PartNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing identifiers
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid part type: '{0}' (valid: assembly, part)")]
    InvalidType(String),

    #[error("invalid project prefix: '{0}' (1-10 ASCII letters or digits)")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in part number: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid type indicator '{0}' (valid: A, P)")]
    InvalidIndicator(String),

    #[error("invalid numeric component '{0}' (at least 4 digits)")]
    InvalidNumber(String),

    #[error("invalid record key: '{0}'")]
    InvalidKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_number_formatting() {
        assert_eq!(
            PartNumber::new("BP25", PartType::Assembly, 0).to_string(),
            "BP25-A-0000"
        );
        assert_eq!(
            PartNumber::new("BP25", PartType::Part, 1).to_string(),
            "BP25-P-0001"
        );
        assert_eq!(
            PartNumber::new("BP25", PartType::Assembly, 100).to_string(),
            "BP25-A-0100"
        );
        assert_eq!(
            PartNumber::new("X", PartType::Part, 12345).to_string(),
            "X-P-12345"
        );
    }

    #[test]
    fn test_part_number_parsing() {
        let pn = PartNumber::parse("BP25-P-0042").unwrap();
        assert_eq!(pn.prefix(), "BP25");
        assert_eq!(pn.part_type(), PartType::Part);
        assert_eq!(pn.numeric_id(), 42);
        assert_eq!(pn.to_string(), "BP25-P-0042");
    }

    #[test]
    fn test_part_number_parse_errors() {
        assert!(matches!(
            PartNumber::parse("BP25A0000").unwrap_err(),
            IdParseError::MissingDelimiter(_)
        ));
        assert!(matches!(
            PartNumber::parse("BP25-X-0000").unwrap_err(),
            IdParseError::InvalidIndicator(_)
        ));
        assert!(matches!(
            PartNumber::parse("BP25-A-12").unwrap_err(),
            IdParseError::InvalidNumber(_)
        ));
        assert!(matches!(
            PartNumber::parse("B_P-A-0000").unwrap_err(),
            IdParseError::InvalidPrefix(_)
        ));
    }

    #[test]
    fn test_part_type_parsing() {
        assert_eq!("assembly".parse::<PartType>().unwrap(), PartType::Assembly);
        assert_eq!(" Part ".parse::<PartType>().unwrap(), PartType::Part);
        assert!(matches!(
            "widget".parse::<PartType>().unwrap_err(),
            IdParseError::InvalidType(_)
        ));
        for ty in PartType::all() {
            assert_eq!(PartType::from_indicator(ty.indicator()), Some(*ty));
        }
    }

    #[test]
    fn test_store_key_parsing() {
        assert_eq!("#12".parse::<PartId>().unwrap(), PartId(12));
        assert_eq!("7".parse::<ProjectId>().unwrap(), ProjectId(7));
        assert_eq!(PartId(3).to_string(), "#3");
        assert!("#abc".parse::<PartId>().is_err());
    }

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("BP25").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("TOO-LONG").is_err());
        assert!(validate_prefix("ABCDEFGHIJK").is_err());
    }
}
