//! The 31-Jan-2018 equity grandfathering rule (§4.3). Only equity mutual
//! funds and Indian stocks are eligible; callers check
//! [`ledger_domain::AssetClass::is_grandfathering_eligible`] before
//! calling into this module.

use chrono::NaiveDate;
use ledger_domain::Money;

/// The grandfathering cutoff date: fair-market value on this date is the
/// reference point for equity cost-of-acquisition substitution.
pub fn cutoff_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 31).unwrap()
}

/// The date LTCG taxation on equity began; sales before this date are
/// exempt regardless of grandfathering.
pub fn ltcg_regime_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 4, 1).unwrap()
}

/// Outcome of applying the grandfathering rule to one matched lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrandfatheredCoa {
    pub cost_of_acquisition: Money,
    pub is_grandfathered: bool,
    /// True when grandfathering should have applied (purchase before the
    /// cutoff) but no FMV was available, so `purchase_value` was used as
    /// a fallback and the result should be flagged non-grandfathered.
    pub fmv_missing: bool,
}

/// Computes cost of acquisition for one matched lot under the
/// grandfathering rule.
///
/// - purchased after the cutoff: COA = purchase value, unconditionally.
/// - purchased on/before the cutoff and sold before the LTCG regime
///   began: COA = sale value (the gain is exempt either way).
/// - purchased on/before the cutoff and sold on/after the regime start:
///   COA = max(purchase value, min(FMV, sale value)).
pub fn cost_of_acquisition(
    purchase_date: NaiveDate,
    sale_date: NaiveDate,
    purchase_value: Money,
    sale_value: Money,
    fair_market_value_31jan2018: Option<Money>,
) -> GrandfatheredCoa {
    if purchase_date > cutoff_date() {
        return GrandfatheredCoa {
            cost_of_acquisition: purchase_value,
            is_grandfathered: false,
            fmv_missing: false,
        };
    }

    if sale_date < ltcg_regime_start() {
        return GrandfatheredCoa {
            cost_of_acquisition: sale_value,
            is_grandfathered: true,
            fmv_missing: false,
        };
    }

    match fair_market_value_31jan2018 {
        Some(fmv) => {
            let floor = fmv.min(sale_value);
            GrandfatheredCoa {
                cost_of_acquisition: purchase_value.max(floor),
                is_grandfathered: true,
                fmv_missing: false,
            }
        }
        None => GrandfatheredCoa {
            cost_of_acquisition: purchase_value,
            is_grandfathered: false,
            fmv_missing: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn fmv_between_purchase_and_sale_is_the_floor() {
        let result = cost_of_acquisition(
            d("2015-01-01"),
            d("2020-01-01"),
            Money::new(dec!(1000)),
            Money::new(dec!(2000)),
            Some(Money::new(dec!(1500))),
        );
        assert_eq!(result.cost_of_acquisition, Money::new(dec!(1500)));
        assert!(result.is_grandfathered);
    }

    #[test]
    fn sale_value_below_fmv_caps_the_floor() {
        let result = cost_of_acquisition(
            d("2015-01-01"),
            d("2020-01-01"),
            Money::new(dec!(1000)),
            Money::new(dec!(1200)),
            Some(Money::new(dec!(1500))),
        );
        assert_eq!(result.cost_of_acquisition, Money::new(dec!(1200)));
    }

    #[test]
    fn sale_below_purchase_floors_at_purchase_value() {
        let result = cost_of_acquisition(
            d("2015-01-01"),
            d("2020-01-01"),
            Money::new(dec!(1000)),
            Money::new(dec!(900)),
            Some(Money::new(dec!(1500))),
        );
        assert_eq!(result.cost_of_acquisition, Money::new(dec!(1000)));
    }

    #[test]
    fn purchase_after_cutoff_ignores_fmv() {
        let result = cost_of_acquisition(
            d("2019-01-01"),
            d("2020-01-01"),
            Money::new(dec!(1000)),
            Money::new(dec!(2000)),
            Some(Money::new(dec!(1500))),
        );
        assert_eq!(result.cost_of_acquisition, Money::new(dec!(1000)));
        assert!(!result.is_grandfathered);
    }

    #[test]
    fn sale_before_regime_start_is_exempt_at_sale_value() {
        let result = cost_of_acquisition(
            d("2016-01-01"),
            d("2018-02-01"),
            Money::new(dec!(1000)),
            Money::new(dec!(3000)),
            None,
        );
        assert_eq!(result.cost_of_acquisition, Money::new(dec!(3000)));
        assert!(result.is_grandfathered);
    }

    #[test]
    fn missing_fmv_falls_back_to_purchase_value_and_flags_it() {
        let result = cost_of_acquisition(
            d("2015-01-01"),
            d("2020-01-01"),
            Money::new(dec!(1000)),
            Money::new(dec!(2000)),
            None,
        );
        assert_eq!(result.cost_of_acquisition, Money::new(dec!(1000)));
        assert!(!result.is_grandfathered);
        assert!(result.fmv_missing);
    }
}
