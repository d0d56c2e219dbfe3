//! Maps a business event to the two account codes a simple journal posts
//! against (§4.2: posting rules are a table from `(event_kind, leg_role)`
//! to account codes, never the reverse). Events whose legs aren't a
//! straightforward cash/holding pair (a sale realizing a gain, a
//! dividend with TDS withheld) are composed directly by the caller out
//! of [`crate::journal::JournalLeg`]s rather than forced through this
//! table; this only covers the postings that really are one debit and
//! one credit.

use ledger_domain::{AccountCode, AssetClass, LedgerError, LedgerResult, TxnKind};

use crate::chart::holding_account;

fn holding_base_account(asset_class: AssetClass) -> Option<&'static str> {
    match asset_class {
        AssetClass::EquityMutualFund => Some("1201"),
        AssetClass::DebtMutualFund => Some("1202"),
        AssetClass::IndianStock => Some("1203"),
        AssetClass::ForeignStock => Some("1204"),
        AssetClass::Rsu => Some("1205"),
        AssetClass::Espp => Some("1206"),
        AssetClass::SovereignGoldBond => Some("1207"),
        AssetClass::Ppf => Some("1301"),
        AssetClass::Epf => Some("1302"),
        AssetClass::Nps => Some("1303"),
        AssetClass::Bank | AssetClass::Other => None,
    }
}

/// Resolves `(debit_account, credit_account)` for a two-leg posting.
/// `symbol` is required whenever `asset_class` has a holding account
/// (it becomes the sub-account suffix); pass the scheme/folio/ISIN as
/// appropriate for the asset class.
pub fn resolve_simple_posting(
    txn_kind: TxnKind,
    asset_class: AssetClass,
    symbol: Option<&str>,
) -> LedgerResult<(AccountCode, AccountCode)> {
    let holding = || -> LedgerResult<AccountCode> {
        let base = holding_base_account(asset_class)
            .ok_or_else(|| LedgerError::invalid(format!("{asset_class:?} has no holding account")))?;
        let symbol = symbol
            .ok_or_else(|| LedgerError::invalid("a symbol/folio/account-number is required for this posting"))?;
        Ok(holding_account(base, symbol))
    };
    let bank = AccountCode::new("1101");

    match txn_kind {
        TxnKind::StockBuy | TxnKind::MfPurchase | TxnKind::PpfDeposit | TxnKind::EpfContribution
        | TxnKind::NpsContribution => Ok((holding()?, bank)),

        TxnKind::StockSell | TxnKind::MfRedemption | TxnKind::PpfWithdrawal
        | TxnKind::EpfWithdrawal | TxnKind::NpsWithdrawal => Ok((bank, holding()?)),

        TxnKind::Dividend => Ok((bank, AccountCode::new("4101"))),
        TxnKind::InterestCredit => Ok((bank, AccountCode::new("4102"))),

        TxnKind::RsuVest => Ok((holding()?, AccountCode::new("4301"))),
        TxnKind::EsppPurchase => Ok((holding()?, bank)),

        TxnKind::BankFee => Ok((AccountCode::new("5101"), bank)),
        TxnKind::TdsDeduction => Ok((AccountCode::new("5202"), AccountCode::new("2901"))),
        TxnKind::AdvanceTaxPayment => Ok((AccountCode::new("5201"), bank)),

        TxnKind::ForeignStockSale | TxnKind::CompensatingReversal | TxnKind::BankTransfer => {
            Err(LedgerError::invalid(format!(
                "{txn_kind:?} is a multi-leg (or two-distinct-account) posting; build its JournalLegs directly"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mf_purchase_debits_holding_credits_bank() {
        let (debit, credit) =
            resolve_simple_posting(TxnKind::MfPurchase, AssetClass::EquityMutualFund, Some("F123-SCHEME")).unwrap();
        assert_eq!(debit.0, "1201:F123-SCHEME");
        assert_eq!(credit.0, "1101");
    }

    #[test]
    fn dividend_credits_income_debits_bank() {
        let (debit, credit) =
            resolve_simple_posting(TxnKind::Dividend, AssetClass::EquityMutualFund, None).unwrap();
        assert_eq!(debit.0, "1101");
        assert_eq!(credit.0, "4101");
    }

    #[test]
    fn missing_symbol_for_a_holding_posting_is_rejected() {
        let result = resolve_simple_posting(TxnKind::StockBuy, AssetClass::IndianStock, None);
        assert!(result.is_err());
    }
}
