use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{UtcDateTime, ValidationError, VenueId};

/// Order side in the unified model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    /// Parse a venue-native side spelling ("Buy", "SELL", "buy", ...).
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => Err(ValidationError::InvalidSide {
                value: other.to_owned(),
            }),
        }
    }
}

/// Order kind in the unified model; each adapter maps this to its venue's spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Market,
    Limit,
}

/// One asset balance at one venue.
///
/// Quantities and values are `Decimal` (serialized as decimal strings); money
/// arithmetic never goes through binary floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedBalance {
    pub venue: VenueId,
    pub asset: String,
    pub quantity: Decimal,
    pub usd_value: Decimal,
    pub display_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_ref: Option<String>,
}

impl UnifiedBalance {
    pub fn new(venue: VenueId, asset: impl Into<String>, quantity: Decimal, usd_value: Decimal) -> Self {
        Self {
            venue,
            asset: asset.into(),
            quantity,
            usd_value,
            display_color: venue.display_color().to_owned(),
            logo_ref: Some(venue.logo_ref().to_owned()),
        }
    }
}

/// One market ticker at one venue.
///
/// `symbol` keeps the venue-native pair spelling ("BTCUSDT" vs "BTC-USDT" vs
/// "EUR/USD"); callers match on `(venue, symbol)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedTicker {
    pub venue: VenueId,
    pub symbol: String,
    pub last_price: Decimal,
    pub change_abs: Decimal,
    pub change_pct: Decimal,
    pub volume: Decimal,
    pub display_color: String,
}

impl UnifiedTicker {
    pub fn new(
        venue: VenueId,
        symbol: impl Into<String>,
        last_price: Decimal,
        change_abs: Decimal,
        change_pct: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            venue,
            symbol: symbol.into(),
            last_price,
            change_abs,
            change_pct,
            volume,
            display_color: venue.display_color().to_owned(),
        }
    }
}

/// One historical order at one venue.
///
/// `order_id` is unique only within its venue; global uniqueness is
/// `(venue, order_id)`. `status` stays venue-native free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedOrder {
    pub venue: VenueId,
    pub order_id: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub status: String,
    pub submitted_at: UtcDateTime,
    pub display_color: String,
}

impl UnifiedOrder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        venue: VenueId,
        order_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        order_type: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
        status: impl Into<String>,
        submitted_at: UtcDateTime,
    ) -> Self {
        Self {
            venue,
            order_id: order_id.into(),
            symbol: symbol.into(),
            side,
            order_type: order_type.into(),
            quantity,
            price,
            status: status.into(),
            submitted_at,
            display_color: venue.display_color().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parses_venue_native_side_spellings() {
        assert_eq!(Side::parse("Buy").expect("valid"), Side::Buy);
        assert_eq!(Side::parse("SELL").expect("valid"), Side::Sell);
        let err = Side::parse("hold").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidSide { .. }));
    }

    #[test]
    fn balance_carries_venue_presentation_metadata() {
        let balance = UnifiedBalance::new(VenueId::Okx, "ETH", dec!(2.85), dec!(6925.75));
        assert_eq!(balance.display_color, "#108EE9");
        assert_eq!(balance.logo_ref.as_deref(), Some("/logos/okx-logo.jpg"));
    }

    #[test]
    fn decimal_fields_serialize_as_strings() {
        let ticker = UnifiedTicker::new(
            VenueId::Bybit,
            "BTCUSDT",
            dec!(103603.7),
            dec!(-0.99),
            dec!(-0.99),
            dec!(45623789),
        );
        let json = serde_json::to_value(&ticker).expect("serializable");
        assert_eq!(json["last_price"], "103603.7");
        assert_eq!(json["change_pct"], "-0.99");
    }
}
