use rust_decimal::Decimal;

use crate::engine::pricing::round_money;
use crate::models::job::{PayoutSplit, PriceBreakdown};

/// Split the pool left after the service fee between driver and platform.
///
/// The service fee is platform-only revenue and never enters the split.
/// Commission is rounded to cents and the remainder goes to the driver,
/// so driver_payout + platform_commission + service_fee = total exactly.
pub fn split(price: &PriceBreakdown, commission_rate: Decimal) -> PayoutSplit {
    let pool = price.total - price.service_fee;
    let platform_commission = round_money(pool * commission_rate);

    PayoutSplit {
        driver_payout: pool - platform_commission,
        platform_commission,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::split;
    use crate::models::job::PriceBreakdown;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn price(items: &str, fee: &str, total: &str) -> PriceBreakdown {
        PriceBreakdown {
            items: dec(items),
            volume_adjustment: Decimal::ZERO,
            surge: Decimal::ZERO,
            service_fee: dec(fee),
            total: dec(total),
        }
    }

    #[test]
    fn twenty_percent_commission_on_the_pool() {
        let payout = split(&price("125.00", "12.50", "137.50"), dec("0.20"));

        assert_eq!(payout.platform_commission, dec("25.00"));
        assert_eq!(payout.driver_payout, dec("100.00"));
    }

    #[test]
    fn split_plus_fee_reconstructs_the_total() {
        let breakdown = price("101.37", "10.14", "111.51");
        let payout = split(&breakdown, dec("0.20"));

        assert_eq!(
            payout.driver_payout + payout.platform_commission + breakdown.service_fee,
            breakdown.total
        );
    }

    #[test]
    fn rounding_remainder_goes_to_the_driver() {
        // pool = 99.99; 20% = 19.998, rounds to 20.00
        let payout = split(&price("99.99", "0.00", "99.99"), dec("0.20"));

        assert_eq!(payout.platform_commission, dec("20.00"));
        assert_eq!(payout.driver_payout, dec("79.99"));
    }

    #[test]
    fn zero_commission_rate_gives_driver_the_pool() {
        let payout = split(&price("80.00", "8.00", "88.00"), Decimal::ZERO);

        assert_eq!(payout.platform_commission, Decimal::ZERO);
        assert_eq!(payout.driver_payout, dec("80.00"));
    }
}
