use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical venue identifiers used as map keys across the unified model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueId {
    Bybit,
    Okx,
    Binance,
    Alpaca,
}

impl VenueId {
    pub const ALL: [Self; 4] = [Self::Bybit, Self::Okx, Self::Binance, Self::Alpaca];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bybit => "bybit",
            Self::Okx => "okx",
            Self::Binance => "binance",
            Self::Alpaca => "alpaca",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Bybit => "Bybit",
            Self::Okx => "OKX",
            Self::Binance => "Binance",
            Self::Alpaca => "Alpaca",
        }
    }

    /// Hex accent color used when rendering records for this venue.
    pub const fn display_color(self) -> &'static str {
        match self {
            Self::Bybit => "#F7931A",
            Self::Okx => "#108EE9",
            Self::Binance => "#F3BA2F",
            Self::Alpaca => "#00C896",
        }
    }

    pub const fn logo_ref(self) -> &'static str {
        match self {
            Self::Bybit => "/logos/bybit-logo.jpg",
            Self::Okx => "/logos/okx-logo.jpg",
            Self::Binance => "/logos/binance-logo.jpg",
            Self::Alpaca => "/logos/alpaca-logo.jpg",
        }
    }
}

impl Display for VenueId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VenueId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bybit" => Ok(Self::Bybit),
            "okx" => Ok(Self::Okx),
            "binance" => Ok(Self::Binance),
            "alpaca" => Ok(Self::Alpaca),
            other => Err(ValidationError::InvalidVenue {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_venue_case_insensitively() {
        let venue = VenueId::from_str(" OKX ").expect("must parse");
        assert_eq!(venue, VenueId::Okx);
    }

    #[test]
    fn rejects_unknown_venue() {
        let err = VenueId::from_str("kraken").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidVenue { .. }));
    }

    #[test]
    fn every_venue_has_presentation_metadata() {
        for venue in VenueId::ALL {
            assert!(venue.display_color().starts_with('#'));
            assert!(venue.logo_ref().starts_with("/logos/"));
            assert!(!venue.display_name().is_empty());
        }
    }
}
