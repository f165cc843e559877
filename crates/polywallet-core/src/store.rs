//! Pure in-memory transformations over aggregated collections.
//!
//! Everything here is presentation-side data shaping: no I/O, no interior
//! state, fresh values in and fresh values out.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::adapters::{classify_asset, AssetKind};
use crate::{Side, UnifiedBalance, UnifiedOrder, VenueId};

/// Merge duplicate `(venue, asset)` rows by summing quantity and USD value,
/// upholding the one-record-per-pair invariant of an aggregation pass.
pub fn dedupe_balances(balances: Vec<UnifiedBalance>) -> Vec<UnifiedBalance> {
    let mut merged: Vec<UnifiedBalance> = Vec::with_capacity(balances.len());
    let mut index: HashMap<(VenueId, String), usize> = HashMap::new();

    for balance in balances {
        let key = (balance.venue, balance.asset.clone());
        match index.get(&key) {
            Some(&position) => {
                merged[position].quantity += balance.quantity;
                merged[position].usd_value += balance.usd_value;
            }
            None => {
                index.insert(key, merged.len());
                merged.push(balance);
            }
        }
    }

    merged
}

/// Sort newest-first by submission time; equal timestamps keep their
/// incoming relative order.
pub fn sort_orders_desc(orders: &mut [UnifiedOrder]) {
    orders.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
}

/// Presentation-side order filtering.
pub fn filter_orders<'a>(
    orders: &'a [UnifiedOrder],
    venue: Option<VenueId>,
    side: Option<Side>,
    symbol_contains: Option<&str>,
) -> Vec<&'a UnifiedOrder> {
    orders
        .iter()
        .filter(|order| venue.map_or(true, |venue| order.venue == venue))
        .filter(|order| side.map_or(true, |side| order.side == side))
        .filter(|order| {
            symbol_contains.map_or(true, |needle| {
                order
                    .symbol
                    .to_ascii_uppercase()
                    .contains(&needle.to_ascii_uppercase())
            })
        })
        .collect()
}

/// Portfolio totals over one balance aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_usd: Decimal,
    pub by_venue: BTreeMap<VenueId, Decimal>,
}

impl PortfolioSummary {
    pub fn from_balances(balances: &[UnifiedBalance]) -> Self {
        let mut by_venue: BTreeMap<VenueId, Decimal> = BTreeMap::new();
        let mut total_usd = Decimal::ZERO;

        for balance in balances {
            *by_venue.entry(balance.venue).or_insert(Decimal::ZERO) += balance.usd_value;
            total_usd += balance.usd_value;
        }

        Self { total_usd, by_venue }
    }

    pub fn venue_total(&self, venue: VenueId) -> Decimal {
        self.by_venue.get(&venue).copied().unwrap_or(Decimal::ZERO)
    }
}

/// USD totals of the broker venue's balances bucketed by asset class
/// (the forex/cash/equity split the classification convention exists for).
pub fn broker_asset_class_totals(balances: &[UnifiedBalance]) -> BTreeMap<AssetKind, Decimal> {
    let mut totals: BTreeMap<AssetKind, Decimal> = BTreeMap::new();
    for balance in balances.iter().filter(|b| b.venue == VenueId::Alpaca) {
        *totals
            .entry(classify_asset(&balance.asset))
            .or_insert(Decimal::ZERO) += balance.usd_value;
    }
    totals
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::UtcDateTime;

    fn order(venue: VenueId, symbol: &str, side: Side, millis: i64) -> UnifiedOrder {
        UnifiedOrder::new(
            venue,
            format!("{}-{millis}", venue.as_str()),
            symbol,
            side,
            "market",
            dec!(1),
            dec!(10),
            "filled",
            UtcDateTime::from_unix_millis(millis).expect("valid"),
        )
    }

    #[test]
    fn dedupe_sums_quantities_for_the_same_venue_asset_pair() {
        let merged = dedupe_balances(vec![
            UnifiedBalance::new(VenueId::Alpaca, "USD", dec!(100), dec!(100)),
            UnifiedBalance::new(VenueId::Alpaca, "USD", dec!(50.5), dec!(50.5)),
            UnifiedBalance::new(VenueId::Bybit, "USD", dec!(7), dec!(7)),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].quantity, dec!(150.5));
        assert_eq!(merged[1].venue, VenueId::Bybit);
    }

    #[test]
    fn orders_sort_newest_first_across_venues() {
        let mut orders = vec![
            order(VenueId::Bybit, "BTCUSDT", Side::Buy, 1_000),
            order(VenueId::Okx, "ETH-USDT", Side::Sell, 3_000),
            order(VenueId::Bybit, "BTCUSDT", Side::Sell, 2_000),
        ];
        sort_orders_desc(&mut orders);

        let stamps: Vec<i64> = orders.iter().map(|o| o.submitted_at.unix_millis()).collect();
        assert_eq!(stamps, vec![3_000, 2_000, 1_000]);
    }

    #[test]
    fn filters_compose_and_symbol_match_is_case_insensitive() {
        let orders = vec![
            order(VenueId::Bybit, "BTCUSDT", Side::Buy, 1),
            order(VenueId::Okx, "BTC-USDT", Side::Sell, 2),
            order(VenueId::Okx, "ETH-USDT", Side::Buy, 3),
        ];

        let filtered = filter_orders(&orders, Some(VenueId::Okx), None, Some("btc"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].symbol, "BTC-USDT");

        let sells = filter_orders(&orders, None, Some(Side::Sell), None);
        assert_eq!(sells.len(), 1);
    }

    #[test]
    fn portfolio_totals_equal_the_sum_of_venue_subtotals() {
        let balances = vec![
            UnifiedBalance::new(VenueId::Bybit, "BTC", dec!(0.1), dec!(8650.50)),
            UnifiedBalance::new(VenueId::Alpaca, "USD", dec!(5000), dec!(5000.00)),
            UnifiedBalance::new(VenueId::Alpaca, "AAPL", dec!(50), dec!(9771.00)),
        ];
        let summary = PortfolioSummary::from_balances(&balances);

        assert_eq!(summary.total_usd, dec!(23421.50));
        assert_eq!(summary.venue_total(VenueId::Alpaca), dec!(14771.00));
        assert_eq!(summary.venue_total(VenueId::Okx), Decimal::ZERO);

        let per_venue_sum: Decimal = summary.by_venue.values().copied().sum();
        assert_eq!(per_venue_sum, summary.total_usd);
    }

    #[test]
    fn broker_totals_bucket_by_classification_convention() {
        let balances = vec![
            UnifiedBalance::new(VenueId::Alpaca, "USD", dec!(5000), dec!(5000)),
            UnifiedBalance::new(VenueId::Alpaca, "AAPL", dec!(50), dec!(9771)),
            UnifiedBalance::new(VenueId::Alpaca, "EUR/USD", dec!(10000), dec!(10875)),
            UnifiedBalance::new(VenueId::Bybit, "BTC", dec!(1), dec!(103603)),
        ];
        let totals = broker_asset_class_totals(&balances);

        assert_eq!(totals.get(&AssetKind::Cash), Some(&dec!(5000)));
        assert_eq!(totals.get(&AssetKind::Equity), Some(&dec!(9771)));
        assert_eq!(totals.get(&AssetKind::Forex), Some(&dec!(10875)));
    }
}
