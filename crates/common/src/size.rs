//! Garment size tokens keying a product's stock counters.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a size string is not one of the supported tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown size token: {0:?}")]
pub struct ParseSizeError(pub String);

/// One of the fixed set of sizes a product keeps stock for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SizeToken {
    #[serde(rename = "XS")]
    ExtraSmall,
    #[serde(rename = "S")]
    Small,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
    #[serde(rename = "XL")]
    ExtraLarge,
    #[serde(rename = "XXL")]
    DoubleExtraLarge,
    #[serde(rename = "OS")]
    OneSize,
}

impl SizeToken {
    /// All supported sizes, smallest first.
    pub const ALL: [SizeToken; 7] = [
        SizeToken::ExtraSmall,
        SizeToken::Small,
        SizeToken::Medium,
        SizeToken::Large,
        SizeToken::ExtraLarge,
        SizeToken::DoubleExtraLarge,
        SizeToken::OneSize,
    ];

    /// Returns the canonical token, as stored on order lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeToken::ExtraSmall => "XS",
            SizeToken::Small => "S",
            SizeToken::Medium => "M",
            SizeToken::Large => "L",
            SizeToken::ExtraLarge => "XL",
            SizeToken::DoubleExtraLarge => "XXL",
            SizeToken::OneSize => "OS",
        }
    }

    /// Returns the products table column holding this size's counter.
    ///
    /// The column set is closed, so the name is safe to splice into SQL.
    pub fn stock_column(&self) -> &'static str {
        match self {
            SizeToken::ExtraSmall => "stock_xs",
            SizeToken::Small => "stock_s",
            SizeToken::Medium => "stock_m",
            SizeToken::Large => "stock_l",
            SizeToken::ExtraLarge => "stock_xl",
            SizeToken::DoubleExtraLarge => "stock_xxl",
            SizeToken::OneSize => "stock_os",
        }
    }

    /// Parses a size token, case-insensitively.
    ///
    /// Accepts `ONE SIZE` and `ONE-SIZE` as spellings of `OS`.
    pub fn parse(s: &str) -> Result<Self, ParseSizeError> {
        match s.trim().to_ascii_uppercase().as_str() {
            "XS" => Ok(SizeToken::ExtraSmall),
            "S" => Ok(SizeToken::Small),
            "M" => Ok(SizeToken::Medium),
            "L" => Ok(SizeToken::Large),
            "XL" => Ok(SizeToken::ExtraLarge),
            "XXL" => Ok(SizeToken::DoubleExtraLarge),
            "OS" | "ONE SIZE" | "ONE-SIZE" => Ok(SizeToken::OneSize),
            _ => Err(ParseSizeError(s.to_string())),
        }
    }
}

impl FromStr for SizeToken {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for SizeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_every_canonical_token() {
        for size in SizeToken::ALL {
            assert_eq!(SizeToken::parse(size.as_str()), Ok(size));
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(SizeToken::parse(" xl "), Ok(SizeToken::ExtraLarge));
        assert_eq!(SizeToken::parse("One Size"), Ok(SizeToken::OneSize));
    }

    #[test]
    fn parse_rejects_unknown_tokens() {
        assert_eq!(
            SizeToken::parse("XXXL"),
            Err(ParseSizeError("XXXL".to_string()))
        );
        assert!("".parse::<SizeToken>().is_err());
    }

    #[test]
    fn stock_columns_are_distinct() {
        let mut columns: Vec<_> = SizeToken::ALL.iter().map(|s| s.stock_column()).collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), SizeToken::ALL.len());
    }

    #[test]
    fn serializes_as_canonical_token() {
        assert_eq!(
            serde_json::to_string(&SizeToken::DoubleExtraLarge).unwrap(),
            "\"XXL\""
        );
    }
}
