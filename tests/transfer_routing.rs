//! End-to-end scenarios for the transfer router: route resolution, fee
//! arithmetic, and the simulated initiation facade.

use polywallet_core::{
    compute_transfer, initiate_transfer, resolve_route, FeeKind, TransferRejection, TransferState,
    VenueId,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn every_self_pair_is_flat_zero_and_instant() {
    for venue in VenueId::ALL {
        let route = resolve_route(venue, venue).expect("self route exists");
        assert_eq!(route.fee_kind, FeeKind::Flat);
        assert_eq!(route.fee_amount, Decimal::ZERO);
        assert!(route.instant);
    }
}

#[test]
fn flat_fee_transfer_from_bybit_to_okx() {
    // initiate(bybit, okx, USDT, 100) over the Flat(2.5 USDT) route
    let result =
        initiate_transfer(VenueId::Bybit, VenueId::Okx, "USDT", dec!(100)).expect("must settle");

    assert_eq!(result.quote.fee, dec!(2.5));
    assert_eq!(result.quote.net_received, dec!(97.5));
    assert!(!result.route.instant);
    assert_eq!(result.route.eta, "5-15 min");
    assert_eq!(result.state, TransferState::SimulatedSettled);
    assert!(result.transaction_id.starts_with("transfer-bybit-okx-"));
}

#[test]
fn percentage_fee_transfer_through_the_broker_leg() {
    let route = resolve_route(VenueId::Alpaca, VenueId::Bybit).expect("route exists");
    assert_eq!(route.fee_kind, FeeKind::Percentage);
    assert_eq!(route.fee_amount, dec!(0.5));

    let quote = compute_transfer(route, dec!(100));
    assert_eq!(quote.fee, dec!(0.5));
    assert_eq!(quote.net_received, dec!(99.5));
}

#[test]
fn flat_fee_larger_than_amount_floors_net_at_zero() {
    let route = resolve_route(VenueId::Okx, VenueId::Bybit).expect("route exists");
    let quote = compute_transfer(route, dec!(2));
    assert_eq!(quote.fee, dec!(3.0));
    assert_eq!(quote.net_received, Decimal::ZERO);
}

#[test]
fn same_venue_transfer_is_rejected_by_name() {
    let rejection = initiate_transfer(VenueId::Bybit, VenueId::Bybit, "USDT", dec!(10))
        .expect_err("same venue must reject");
    assert_eq!(
        rejection,
        TransferRejection::SameVenue {
            venue: VenueId::Bybit
        }
    );
}

#[test]
fn non_positive_amounts_are_rejected_by_name() {
    for amount in [dec!(0), dec!(-5)] {
        let rejection = initiate_transfer(VenueId::Bybit, VenueId::Okx, "USDT", amount)
            .expect_err("non-positive amount must reject");
        assert_eq!(rejection, TransferRejection::NonPositiveAmount { amount });
    }
}

#[test]
fn cross_venue_fee_schedule_matches_configuration() {
    let expectations = [
        (VenueId::Bybit, VenueId::Okx, dec!(2.5)),
        (VenueId::Bybit, VenueId::Binance, dec!(1.5)),
        (VenueId::Okx, VenueId::Bybit, dec!(3.0)),
        (VenueId::Okx, VenueId::Binance, dec!(2.0)),
        (VenueId::Binance, VenueId::Bybit, dec!(2.0)),
        (VenueId::Binance, VenueId::Okx, dec!(2.5)),
    ];
    for (from, to, fee) in expectations {
        let route = resolve_route(from, to).expect("route exists");
        assert_eq!(route.fee_kind, FeeKind::Flat, "{from}->{to}");
        assert_eq!(route.fee_amount, fee, "{from}->{to}");
        assert_eq!(route.fee_currency, "USDT");
    }

    // Every leg touching the broker venue is a 0.5% percentage route.
    for other in [VenueId::Bybit, VenueId::Okx, VenueId::Binance] {
        for (from, to) in [(VenueId::Alpaca, other), (other, VenueId::Alpaca)] {
            let route = resolve_route(from, to).expect("route exists");
            assert_eq!(route.fee_kind, FeeKind::Percentage, "{from}->{to}");
            assert_eq!(route.fee_amount, dec!(0.5), "{from}->{to}");
            assert_eq!(route.eta, "1-2 hours");
        }
    }
}
