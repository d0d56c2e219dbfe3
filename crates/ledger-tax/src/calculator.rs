//! The advance-tax calculator (§4.8): categorize income into buckets,
//! apply standard deductions, tax slab income through the slab table,
//! tax equity STCG/LTCG at their special rates (LTCG after the
//! ₹1,25,000 exemption), apply the §87A rebate, layer surcharge and
//! cess, and persist the result as the new `is_latest` row for
//! `(user, fy, regime)`.
//!
//! Steps mirror the categorize/deduct/slab-tax/special-rate-tax/rebate/
//! surcharge/cess sequence the original advance-tax service runs,
//! transcribed faithfully rather than redesigned.

use chrono::NaiveDate;
use ledger_domain::{AssetClass, FinancialYear, HoldingPeriod, LedgerResult, Money, Regime, UserId};
use ledger_taxrules::TaxRulesService;
use rust_decimal::Decimal;
use rusqlite::Transaction;

use crate::income::{IncomeBucket, IncomeRecord};

/// The result of one advance-tax computation run, as persisted to
/// `advance_tax_computations`.
#[derive(Debug, Clone)]
pub struct AdvanceTaxResult {
    pub gross_income: Money,
    pub taxable_income: Money,
    pub slab_tax: Money,
    pub special_rate_tax: Money,
    pub rebate: Money,
    pub surcharge: Money,
    pub cess: Money,
    pub total_liability: Money,
    pub tds_paid: Money,
    pub advance_tax_paid: Money,
    pub balance_payable: Money,
}

fn slab_tax(slabs: &[ledger_taxrules::TaxSlab], taxable: Money) -> Money {
    let mut tax = Money::ZERO;
    for slab in slabs {
        if taxable.raw() <= slab.lower_bound.raw() {
            continue;
        }
        let upper = slab.upper_bound.map(|u| u.raw()).unwrap_or(taxable.raw());
        let bracket_top = taxable.raw().min(upper);
        let in_bracket = (bracket_top - slab.lower_bound.raw()).max(Decimal::ZERO);
        tax += Money::new(in_bracket).checked_mul_rate(slab.rate);
    }
    tax
}

fn special_rate_tax_for(
    tax_rules: &TaxRulesService,
    conn: &rusqlite::Connection,
    fy: FinancialYear,
    asset_class: AssetClass,
    term: HoldingPeriod,
    gains: Money,
) -> LedgerResult<Money> {
    if gains.is_zero() || gains.is_negative() {
        return Ok(Money::ZERO);
    }
    let Some(cg_rate) = tax_rules.get_cg_rate(conn, fy, asset_class, term)? else {
        return Ok(Money::ZERO);
    };
    let taxable = (gains - cg_rate.exemption_limit).max(Money::ZERO);
    Ok(taxable.checked_mul_rate(cg_rate.rate))
}

/// Runs the full 11-step computation and writes the new `is_latest` row.
/// Callers pass the `&Transaction` that also produced `income_records`
/// (via [`crate::aggregator::aggregate_income`]) so the read-then-write
/// sequence is atomic per §4.8 "executed in one transaction".
#[allow(clippy::too_many_arguments)]
pub fn calculate_and_persist(
    tx: &Transaction<'_>,
    tax_rules: &TaxRulesService,
    user_id: UserId,
    fy: FinancialYear,
    regime: Regime,
    as_of: NaiveDate,
    income_records: &[IncomeRecord],
) -> LedgerResult<AdvanceTaxResult> {
    // Step 1: categorize (already done by the aggregator into buckets).
    let mut gross_income = Money::ZERO;
    let mut slab_income = Money::ZERO;
    let mut deductions_total = Money::ZERO;
    let mut tds_paid = Money::ZERO;
    let mut stcg_equity = Money::ZERO;
    let mut ltcg_equity = Money::ZERO;

    for record in income_records {
        gross_income += record.gross;
        deductions_total += record.deductions;
        tds_paid += record.tds;
        match record.bucket {
            IncomeBucket::StcgEquity => stcg_equity += record.taxable,
            IncomeBucket::LtcgEquity => ltcg_equity += record.taxable,
            _ => slab_income += record.taxable,
        }
    }

    // Step 2: standard deductions (salary §16, already folded into
    // `record.taxable` by the aggregator for non-salary buckets; the
    // salary standard deduction is applied here since it is a flat
    // per-return amount rather than per-record).
    let salary_deduction = tax_rules.get_standard_deduction(tx, fy, regime, "SALARY")?;
    slab_income = (slab_income - salary_deduction).max(Money::ZERO);
    deductions_total += salary_deduction;

    let taxable_income = slab_income + stcg_equity + ltcg_equity;

    // Step 3/4: slab tax on non-special-rate income.
    let slabs = tax_rules.get_tax_slabs(tx, fy, regime)?;
    let tax_on_slab_income = slab_tax(&slabs, slab_income);

    // Step 5: special-rate tax on equity STCG/LTCG.
    let tax_on_stcg_equity = special_rate_tax_for(tax_rules, tx, fy, AssetClass::EquityMutualFund, HoldingPeriod::ShortTerm, stcg_equity)?;
    let tax_on_ltcg_equity = special_rate_tax_for(tax_rules, tx, fy, AssetClass::EquityMutualFund, HoldingPeriod::LongTerm, ltcg_equity)?;

    let total_tax_before_rebate = tax_on_slab_income + tax_on_stcg_equity + tax_on_ltcg_equity;

    // Step 6: §87A rebate.
    let rebate_limit = tax_rules.get_rebate_limit(tx, fy, regime)?;
    let rebate = if taxable_income.raw() <= rebate_limit.income_cap.raw() && !total_tax_before_rebate.is_zero() {
        total_tax_before_rebate.min(rebate_limit.max_rebate)
    } else {
        Money::ZERO
    };
    let total_tax_after_rebate = (total_tax_before_rebate - rebate).max(Money::ZERO);

    // Step 7: surcharge. Equity special-rate tax gets the 15%-capped
    // surcharge rate, everything else the normal rate; both are applied
    // against the same post-rebate tax base, in proportion to each
    // component's share (the original applies the capped rate to the
    // equity-CG slice and the normal rate to the rest).
    let equity_component = tax_on_stcg_equity + tax_on_ltcg_equity;
    let normal_component = (total_tax_after_rebate - equity_component).max(Money::ZERO);
    let normal_surcharge_rate = tax_rules.get_surcharge_rate(tx, fy, regime, "NORMAL", taxable_income)?;
    let equity_surcharge_rate = tax_rules.get_surcharge_rate(tx, fy, regime, "EQUITY_CG", taxable_income)?;
    let surcharge = normal_component.checked_mul_rate(normal_surcharge_rate) + equity_component.checked_mul_rate(equity_surcharge_rate);

    let tax_with_surcharge = total_tax_after_rebate + surcharge;

    // Step 8: cess.
    let cess_rate = tax_rules.get_cess_rate(tx, fy)?;
    let cess = tax_with_surcharge.checked_mul_rate(cess_rate);

    // Step 9: total liability.
    let total_liability = tax_with_surcharge + cess;

    // Step 10: balance payable against TDS/advance tax already paid.
    let advance_tax_paid = sum_advance_tax_paid(tx, user_id, fy, as_of)?;
    let balance_payable = (total_liability - tds_paid - advance_tax_paid).max(Money::ZERO);

    let result = AdvanceTaxResult {
        gross_income,
        taxable_income,
        slab_tax: tax_on_slab_income,
        special_rate_tax: tax_on_stcg_equity + tax_on_ltcg_equity,
        rebate,
        surcharge,
        cess,
        total_liability,
        tds_paid,
        advance_tax_paid,
        balance_payable,
    };

    // Step 11: mark prior computations stale, insert the new one.
    tx.execute(
        "UPDATE advance_tax_computations SET is_latest = 0 WHERE user_id = ?1 AND financial_year = ?2 AND regime = ?3",
        rusqlite::params![user_id.0, fy.to_string(), regime_code(regime)],
    )
    .map_err(ledger_store::from_rusqlite)?;

    tx.execute(
        "INSERT INTO advance_tax_computations
            (user_id, financial_year, regime, gross_income, taxable_income, slab_tax, special_rate_tax,
             rebate, surcharge, cess, total_liability, tds_paid, advance_tax_paid, balance_payable,
             is_latest, computed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 1, ?15)",
        rusqlite::params![
            user_id.0,
            fy.to_string(),
            regime_code(regime),
            result.gross_income.raw().to_string(),
            result.taxable_income.raw().to_string(),
            result.slab_tax.raw().to_string(),
            result.special_rate_tax.raw().to_string(),
            result.rebate.raw().to_string(),
            result.surcharge.raw().to_string(),
            result.cess.raw().to_string(),
            result.total_liability.raw().to_string(),
            result.tds_paid.raw().to_string(),
            result.advance_tax_paid.raw().to_string(),
            result.balance_payable.raw().to_string(),
            as_of.to_string(),
        ],
    )
    .map_err(ledger_store::from_rusqlite)?;

    Ok(result)
}

fn regime_code(regime: Regime) -> &'static str {
    match regime {
        Regime::Old => "OLD",
        Regime::New => "NEW",
    }
}

fn sum_advance_tax_paid(tx: &Transaction<'_>, user_id: UserId, fy: FinancialYear, as_of: NaiveDate) -> LedgerResult<Money> {
    let total: Option<f64> = tx
        .query_row(
            "SELECT SUM(CAST(je.credit AS REAL))
             FROM journal_entries je
             JOIN journals j ON j.id = je.journal_id
             WHERE j.user_id = ?1 AND je.account_code = '5201'
               AND j.txn_date >= ?2 AND j.txn_date <= ?3",
            rusqlite::params![user_id.0, fy.start_date().to_string(), as_of.to_string()],
            |row| row.get(0),
        )
        .map_err(ledger_store::from_rusqlite)?;
    Ok(Money::new(total.and_then(|t| Decimal::try_from(t).ok()).unwrap_or(Decimal::ZERO)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_store::Store;
    use rust_decimal_macros::dec;

    fn seed_new_regime_fy2425(conn: &rusqlite::Connection) {
        conn.execute(
            "INSERT INTO income_tax_slabs (financial_year, regime, slab_order, lower_bound, upper_bound, rate)
             VALUES
                ('2024-25','NEW',1,'0','300000','0'),
                ('2024-25','NEW',2,'300000','700000','0.05'),
                ('2024-25','NEW',3,'700000','1000000','0.10'),
                ('2024-25','NEW',4,'1000000','1200000','0.15'),
                ('2024-25','NEW',5,'1200000','1500000','0.20'),
                ('2024-25','NEW',6,'1500000',NULL,'0.30')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO capital_gains_rates (financial_year, asset_class, term, rate, exemption_limit)
             VALUES ('2024-25','EQUITY_MF','LONG','0.125','125000'),
                    ('2024-25','EQUITY_MF','SHORT','0.20','0')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO standard_deductions (financial_year, regime, income_type, amount)
             VALUES ('2024-25','NEW','SALARY','75000')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO rebate_limits (financial_year, regime, income_cap, max_rebate)
             VALUES ('2024-25','NEW','700000','25000')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO surcharge_rates (financial_year, regime, income_type, lower_bound, upper_bound, rate, rate_cap)
             VALUES ('2024-25','NEW','NORMAL','0',NULL,'0',NULL),
                    ('2024-25','NEW','EQUITY_CG','0',NULL,'0',NULL)",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO cess_rates (financial_year, rate) VALUES ('2024-25','0.04')", [])
            .unwrap();
    }

    #[test]
    fn salary_plus_equity_ltcg_scenario() {
        let store = Store::open_in_memory().unwrap();
        {
            let conn = store.conn().unwrap();
            seed_new_regime_fy2425(&conn);
        }
        let tax_rules = TaxRulesService::new();
        let records = vec![
            IncomeRecord {
                bucket: IncomeBucket::Salary,
                sub_classification: "SALARY".into(),
                sub_grouping: "FORM16".into(),
                gross: Money::new(dec!(1200000)),
                deductions: Money::ZERO,
                taxable: Money::new(dec!(1200000)),
                tds: Money::ZERO,
            },
            IncomeRecord::new(IncomeBucket::LtcgEquity, "EQUITY_MF", "LTCG", Money::new(dec!(200000))),
        ];

        let result = store
            .with_tx(|tx| {
                calculate_and_persist(
                    tx,
                    &tax_rules,
                    UserId(1),
                    FinancialYear::new(2024),
                    Regime::New,
                    NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
                    &records,
                )
            })
            .unwrap();

        // slab income: 1200000 - 75000 = 1125000; LTCG taxable: 200000-125000=75000 @ 12.5% = 9375
        assert_eq!(result.special_rate_tax, Money::new(dec!(9375)));
        assert!(result.slab_tax.raw() > Decimal::ZERO);
        assert_eq!(result.rebate, Money::ZERO);
    }
}
