//! DTAA / Form-67 foreign tax credit (§4.8 "Foreign tax credit").
//!
//! Credit allowed is `min(foreign tax withheld, Indian tax computed on
//! the same gross income)`, both converted to INR — the treaty rate
//! fetched from `dtaa_rates` is recorded for the Form-67 filing but does
//! not itself cap the credit further, matching how the withholding
//! calculator treats treaty rate and credit ceiling as separate numbers.
//!
//! FX conversion is the caller's responsibility: this module takes an
//! `fx_rate` already resolved (from `foreign_holdings.fx_rate_to_inr`
//! when the income came off a tracked holding, or from the statement
//! itself) rather than owning a rate-provider of its own — there is no
//! `fx_rates` table in this schema, and inventing one to convert a
//! single dividend/interest figure would be a bigger subsystem than the
//! credit calculation it serves.

use ledger_domain::{LedgerResult, Money};
use ledger_taxrules::TaxRulesService;
use rust_decimal::Decimal;
use rusqlite::Connection;

/// A computed DTAA credit, ready to back a Form-67 line.
#[derive(Debug, Clone, PartialEq)]
pub struct DtaaCredit {
    pub gross_income_inr: Money,
    pub foreign_tax_withheld_inr: Money,
    pub indian_tax_on_income: Money,
    pub credit_allowed: Money,
    pub treaty_rate: Option<Decimal>,
}

fn credit_for(
    tax_rules: &TaxRulesService,
    conn: &Connection,
    country: &str,
    income_type: &str,
    gross_income_foreign_ccy: Money,
    tax_withheld_foreign_ccy: Money,
    fx_rate: Decimal,
    indian_tax_rate: Decimal,
) -> LedgerResult<DtaaCredit> {
    let gross_income_inr = gross_income_foreign_ccy.checked_mul_rate(fx_rate);
    let foreign_tax_withheld_inr = tax_withheld_foreign_ccy.checked_mul_rate(fx_rate);
    let indian_tax_on_income = gross_income_inr.checked_mul_rate(indian_tax_rate);
    let credit_allowed = foreign_tax_withheld_inr.min(indian_tax_on_income);
    let treaty_rate = tax_rules.get_dtaa_rate(conn, country, income_type)?;

    Ok(DtaaCredit {
        gross_income_inr,
        foreign_tax_withheld_inr,
        indian_tax_on_income,
        credit_allowed,
        treaty_rate,
    })
}

/// Foreign dividend income credit (§4.8, treaty article DIVIDEND).
pub fn calculate_dividend_credit(
    tax_rules: &TaxRulesService,
    conn: &Connection,
    country: &str,
    gross_dividend_foreign_ccy: Money,
    tax_withheld_foreign_ccy: Money,
    fx_rate: Decimal,
    indian_tax_rate: Decimal,
) -> LedgerResult<DtaaCredit> {
    credit_for(
        tax_rules,
        conn,
        country,
        "DIVIDEND",
        gross_dividend_foreign_ccy,
        tax_withheld_foreign_ccy,
        fx_rate,
        indian_tax_rate,
    )
}

/// Foreign interest income credit (§4.8, treaty article INTEREST).
pub fn calculate_interest_credit(
    tax_rules: &TaxRulesService,
    conn: &Connection,
    country: &str,
    gross_interest_foreign_ccy: Money,
    tax_withheld_foreign_ccy: Money,
    fx_rate: Decimal,
    indian_tax_rate: Decimal,
) -> LedgerResult<DtaaCredit> {
    credit_for(
        tax_rules,
        conn,
        country,
        "INTEREST",
        gross_interest_foreign_ccy,
        tax_withheld_foreign_ccy,
        fx_rate,
        indian_tax_rate,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_store::Store;
    use rust_decimal_macros::dec;

    #[test]
    fn credit_is_the_lesser_of_foreign_tax_and_indian_tax() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.conn().unwrap();
        conn.execute(
            "INSERT INTO dtaa_rates (country, income_type, treaty_rate) VALUES ('US', 'DIVIDEND', '0.25')",
            [],
        )
        .unwrap();
        let tax_rules = TaxRulesService::new();

        // $1000 gross, $250 withheld (25%), fx 83, Indian tax rate 30% ->
        // Indian tax on income = 83000*0.30 = 24900, foreign tax = 250*83=20750.
        let credit = calculate_dividend_credit(
            &tax_rules,
            &conn,
            "US",
            Money::new(dec!(1000)),
            Money::new(dec!(250)),
            dec!(83),
            dec!(0.30),
        )
        .unwrap();

        assert_eq!(credit.foreign_tax_withheld_inr, Money::new(dec!(20750)));
        assert_eq!(credit.indian_tax_on_income, Money::new(dec!(24900)));
        assert_eq!(credit.credit_allowed, Money::new(dec!(20750)));
        assert_eq!(credit.treaty_rate, Some(dec!(0.25)));
    }

    #[test]
    fn credit_caps_at_indian_tax_when_foreign_withholding_is_higher() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.conn().unwrap();
        let tax_rules = TaxRulesService::new();

        let credit = calculate_interest_credit(
            &tax_rules,
            &conn,
            "UK",
            Money::new(dec!(1000)),
            Money::new(dec!(400)),
            dec!(100),
            dec!(0.10),
        )
        .unwrap();

        // foreign tax withheld inr = 40000, indian tax = 100000*0.10=10000 -> credit capped at 10000
        assert_eq!(credit.credit_allowed, Money::new(dec!(10000)));
        assert_eq!(credit.treaty_rate, None);
    }
}
