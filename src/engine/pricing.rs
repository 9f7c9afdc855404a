use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::AppError;
use crate::models::job::{JobItem, PriceBreakdown};

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Price a set of requested items against a rule snapshot.
///
/// The snapshot holds active rules only, copied out of the store at quote
/// time; a job keeps the breakdown computed here and is never repriced
/// when rules change later. Each component is rounded to cents before the
/// total is summed, so the breakdown always adds up exactly.
pub fn quote(
    rules: &HashMap<String, Decimal>,
    items: &[JobItem],
    volume_adjustment: Option<Decimal>,
    surge_multiplier: Decimal,
    service_fee_rate: Decimal,
) -> Result<PriceBreakdown, AppError> {
    if items.is_empty() {
        return Err(AppError::validation("items", "at least one item is required"));
    }

    let mut items_total = Decimal::ZERO;
    for item in items {
        if item.quantity == 0 {
            return Err(AppError::validation(
                "quantity",
                format!("quantity for {} must be at least 1", item.item_type),
            ));
        }

        let base_price = rules
            .get(&item.item_type)
            .ok_or_else(|| AppError::UnknownItemType(item.item_type.clone()))?;

        items_total += round_money(base_price * Decimal::from(item.quantity));
    }

    let volume_adjustment = round_money(volume_adjustment.unwrap_or(Decimal::ZERO));
    if volume_adjustment < Decimal::ZERO {
        return Err(AppError::validation(
            "volume_adjustment",
            "volume adjustment cannot be negative",
        ));
    }

    let subtotal = items_total + volume_adjustment;

    let surge = if surge_multiplier > Decimal::ONE {
        round_money(subtotal * (surge_multiplier - Decimal::ONE))
    } else {
        Decimal::ZERO
    };

    let service_fee = round_money(service_fee_rate * (subtotal + surge));

    Ok(PriceBreakdown {
        items: items_total,
        volume_adjustment,
        surge,
        service_fee,
        total: items_total + volume_adjustment + surge + service_fee,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::quote;
    use crate::error::AppError;
    use crate::models::job::JobItem;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rules() -> HashMap<String, Decimal> {
        HashMap::from([
            ("couch_sofa".to_string(), dec("75.00")),
            ("mattress".to_string(), dec("50.00")),
            ("appliance".to_string(), dec("65.00")),
        ])
    }

    fn item(item_type: &str, quantity: u32) -> JobItem {
        JobItem {
            item_type: item_type.to_string(),
            quantity,
        }
    }

    #[test]
    fn couch_and_mattress_at_ten_percent_fee() {
        let breakdown = quote(
            &rules(),
            &[item("couch_sofa", 1), item("mattress", 1)],
            None,
            Decimal::ONE,
            dec("0.10"),
        )
        .unwrap();

        assert_eq!(breakdown.items, dec("125.00"));
        assert_eq!(breakdown.volume_adjustment, dec("0.00"));
        assert_eq!(breakdown.surge, dec("0.00"));
        assert_eq!(breakdown.service_fee, dec("12.50"));
        assert_eq!(breakdown.total, dec("137.50"));
    }

    #[test]
    fn total_equals_sum_of_components() {
        let breakdown = quote(
            &rules(),
            &[item("couch_sofa", 3), item("appliance", 2)],
            Some(dec("40.00")),
            dec("1.25"),
            dec("0.08"),
        )
        .unwrap();

        assert_eq!(
            breakdown.total,
            breakdown.items + breakdown.volume_adjustment + breakdown.surge + breakdown.service_fee
        );
    }

    #[test]
    fn surge_applies_to_items_plus_volume() {
        let breakdown = quote(
            &rules(),
            &[item("mattress", 2)],
            Some(dec("20.00")),
            dec("1.50"),
            dec("0.10"),
        )
        .unwrap();

        // (100 + 20) * 0.5
        assert_eq!(breakdown.surge, dec("60.00"));
        assert_eq!(breakdown.service_fee, dec("18.00"));
        assert_eq!(breakdown.total, dec("198.00"));
    }

    #[test]
    fn sub_unit_multiplier_floors_surge_at_zero() {
        let breakdown = quote(
            &rules(),
            &[item("mattress", 1)],
            None,
            dec("0.80"),
            dec("0.10"),
        )
        .unwrap();

        assert_eq!(breakdown.surge, dec("0.00"));
        assert_eq!(breakdown.total, dec("55.00"));
    }

    #[test]
    fn unknown_item_type_is_rejected() {
        let err = quote(
            &rules(),
            &[item("piano", 1)],
            None,
            Decimal::ONE,
            dec("0.10"),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::UnknownItemType(ref t) if t == "piano"));
    }

    #[test]
    fn empty_items_are_rejected() {
        let err = quote(&rules(), &[], None, Decimal::ONE, dec("0.10")).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = quote(
            &rules(),
            &[item("mattress", 0)],
            None,
            Decimal::ONE,
            dec("0.10"),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn identical_inputs_price_identically() {
        let items = [item("couch_sofa", 2), item("appliance", 1)];
        let first = quote(&rules(), &items, Some(dec("15.00")), dec("1.30"), dec("0.10")).unwrap();
        let second = quote(&rules(), &items, Some(dec("15.00")), dec("1.30"), dec("0.10")).unwrap();

        assert_eq!(first.total, second.total);
        assert_eq!(first.surge, second.surge);
    }
}
