//! Inter-venue transfer routing: fee policy resolution, quoting, and a
//! simulated initiation facade.
//!
//! No real settlement happens here. The route table is static configuration;
//! `initiate_transfer` validates input, resolves the route, computes the
//! quote, and returns a simulated outcome.

use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{UtcDateTime, VenueId};

/// Fee policy kind for one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeKind {
    Flat,
    Percentage,
}

/// Fee/ETA metadata for one ordered venue pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRoute {
    pub from: VenueId,
    pub to: VenueId,
    pub fee_kind: FeeKind,
    pub fee_amount: Decimal,
    pub fee_currency: &'static str,
    pub eta: &'static str,
    pub instant: bool,
}

impl TransferRoute {
    const fn flat(from: VenueId, to: VenueId, fee_amount: Decimal, eta: &'static str) -> Self {
        Self {
            from,
            to,
            fee_kind: FeeKind::Flat,
            fee_amount,
            fee_currency: "USDT",
            eta,
            instant: false,
        }
    }

    const fn percentage(from: VenueId, to: VenueId, fee_amount: Decimal) -> Self {
        Self {
            from,
            to,
            fee_kind: FeeKind::Percentage,
            fee_amount,
            fee_currency: "%",
            eta: "1-2 hours",
            instant: false,
        }
    }

    const fn internal(venue: VenueId) -> Self {
        Self {
            from: venue,
            to: venue,
            fee_kind: FeeKind::Flat,
            fee_amount: Decimal::ZERO,
            fee_currency: "USD",
            eta: "Instant",
            instant: true,
        }
    }
}

/// Static routing table covering all 16 ordered pairs of the four venues.
/// Same-venue transfers are free and instant; broker legs carry a percentage
/// fee, crypto-to-crypto legs a flat network fee.
static ROUTES: [TransferRoute; 16] = [
    TransferRoute::internal(VenueId::Bybit),
    TransferRoute::internal(VenueId::Okx),
    TransferRoute::internal(VenueId::Binance),
    TransferRoute::internal(VenueId::Alpaca),
    TransferRoute::flat(VenueId::Bybit, VenueId::Okx, dec!(2.5), "5-15 min"),
    TransferRoute::flat(VenueId::Bybit, VenueId::Binance, dec!(1.5), "3-10 min"),
    TransferRoute::flat(VenueId::Okx, VenueId::Bybit, dec!(3.0), "5-15 min"),
    TransferRoute::flat(VenueId::Okx, VenueId::Binance, dec!(2.0), "5-12 min"),
    TransferRoute::flat(VenueId::Binance, VenueId::Bybit, dec!(2.0), "3-10 min"),
    TransferRoute::flat(VenueId::Binance, VenueId::Okx, dec!(2.5), "5-12 min"),
    TransferRoute::percentage(VenueId::Alpaca, VenueId::Bybit, dec!(0.5)),
    TransferRoute::percentage(VenueId::Alpaca, VenueId::Okx, dec!(0.5)),
    TransferRoute::percentage(VenueId::Alpaca, VenueId::Binance, dec!(0.5)),
    TransferRoute::percentage(VenueId::Bybit, VenueId::Alpaca, dec!(0.5)),
    TransferRoute::percentage(VenueId::Okx, VenueId::Alpaca, dec!(0.5)),
    TransferRoute::percentage(VenueId::Binance, VenueId::Alpaca, dec!(0.5)),
];

/// Look up the route for an ordered venue pair.
///
/// The table is complete, so this only returns `None` if the table were ever
/// edited down; callers treat that as a defined rejection, not a panic.
pub fn resolve_route(from: VenueId, to: VenueId) -> Option<&'static TransferRoute> {
    ROUTES
        .iter()
        .find(|route| route.from == from && route.to == to)
}

/// Fee and net-received amounts for one quoted transfer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferQuote {
    pub fee: Decimal,
    pub net_received: Decimal,
}

/// Apply a route's fee policy to an amount.
///
/// Flat: `net = max(0, amount - fee)`. Percentage: `fee = amount * pct / 100`,
/// `net = max(0, amount - fee)`. All arithmetic is decimal-exact.
pub fn compute_transfer(route: &TransferRoute, amount: Decimal) -> TransferQuote {
    let fee = match route.fee_kind {
        FeeKind::Flat => route.fee_amount,
        FeeKind::Percentage => amount * route.fee_amount / Decimal::ONE_HUNDRED,
    };
    let net_received = (amount - fee).max(Decimal::ZERO);
    TransferQuote { fee, net_received }
}

/// Transfer lifecycle state.
///
/// `Requested -> Validated -> RouteResolved -> (SimulatedSettled | Rejected)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    Requested,
    Validated,
    RouteResolved,
    SimulatedSettled,
    Rejected,
}

impl Display for TransferState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Requested => "requested",
            Self::Validated => "validated",
            Self::RouteResolved => "route_resolved",
            Self::SimulatedSettled => "simulated_settled",
            Self::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Named validation rejections for the transfer path.
///
/// Unlike the read paths, these surface to the caller explicitly.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransferRejection {
    #[error("source and destination venue must be different (both {venue})")]
    SameVenue { venue: VenueId },
    #[error("transfer amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Decimal },
    #[error("no route configured from {from} to {to}")]
    UnknownRoute { from: VenueId, to: VenueId },
}

/// Simulated settlement outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferResult {
    pub transaction_id: String,
    pub from: VenueId,
    pub to: VenueId,
    pub asset: String,
    pub amount: Decimal,
    pub quote: TransferQuote,
    pub route: TransferRoute,
    pub state: TransferState,
}

/// Validate, resolve, quote, and simulate one transfer.
///
/// No balance moves; the result is planning/estimation metadata plus a
/// demo transaction id.
pub fn initiate_transfer(
    from: VenueId,
    to: VenueId,
    asset: &str,
    amount: Decimal,
) -> Result<TransferResult, TransferRejection> {
    if from == to {
        return Err(TransferRejection::SameVenue { venue: from });
    }
    if amount <= Decimal::ZERO {
        return Err(TransferRejection::NonPositiveAmount { amount });
    }

    let route = resolve_route(from, to).ok_or(TransferRejection::UnknownRoute { from, to })?;
    let quote = compute_transfer(route, amount);

    Ok(TransferResult {
        transaction_id: format!(
            "transfer-{from}-{to}-{}",
            UtcDateTime::now().unix_millis()
        ),
        from,
        to,
        asset: asset.to_owned(),
        amount,
        quote,
        route: route.clone(),
        state: TransferState::SimulatedSettled,
    })
}
