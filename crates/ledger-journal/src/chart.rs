//! The fixed chart of accounts. Unlike a general ledger product, the set
//! of top-level accounts here is closed: every posting rule in
//! [`crate::posting_rules`] targets one of these codes (or a per-holding
//! sub-account minted under one of them), so there is no account-creation
//! workflow to model.

use ledger_domain::AccountCode;

/// The five classical account types; debit/credit normal balance follows
/// directly from this (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountType {
    /// Whether a debit increases this account's normal balance.
    pub fn debit_increases(&self) -> bool {
        matches!(self, AccountType::Asset | AccountType::Expense)
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub code: AccountCode,
    pub name: &'static str,
    pub account_type: AccountType,
}

macro_rules! accounts {
    ($($code:literal => $name:literal, $ty:expr);* $(;)?) => {
        &[$( ($code, $name, $ty) ),*]
    };
}

const STANDARD_ACCOUNTS: &[(&str, &str, AccountType)] = accounts! {
    "1101" => "Bank Accounts", AccountType::Asset;
    "1102" => "Broker Clearing", AccountType::Asset;
    "1201" => "Equity Mutual Fund Holdings", AccountType::Asset;
    "1202" => "Debt Mutual Fund Holdings", AccountType::Asset;
    "1203" => "Indian Stock Holdings", AccountType::Asset;
    "1204" => "Foreign Stock Holdings", AccountType::Asset;
    "1205" => "RSU Holdings", AccountType::Asset;
    "1206" => "ESPP Holdings", AccountType::Asset;
    "1207" => "Sovereign Gold Bond Holdings", AccountType::Asset;
    "1301" => "PPF Balance", AccountType::Asset;
    "1302" => "EPF Balance", AccountType::Asset;
    "1303" => "NPS Balance", AccountType::Asset;
    "1901" => "Suspense - Unreconciled", AccountType::Asset;
    "2101" => "Home Loan", AccountType::Liability;
    "2102" => "Other Loans", AccountType::Liability;
    "2901" => "TDS Receivable / Payable", AccountType::Liability;
    "3101" => "Opening Balance Equity", AccountType::Equity;
    "3102" => "Retained Net Worth", AccountType::Equity;
    "4101" => "Dividend Income", AccountType::Income;
    "4102" => "Interest Income", AccountType::Income;
    "4201" => "Short-Term Capital Gains", AccountType::Income;
    "4202" => "Long-Term Capital Gains", AccountType::Income;
    "4301" => "RSU Perquisite Income", AccountType::Income;
    "4302" => "ESPP Perquisite Income", AccountType::Income;
    "5101" => "Bank Fees and Charges", AccountType::Expense;
    "5201" => "Advance Tax Paid", AccountType::Expense;
    "5202" => "TDS Deducted", AccountType::Expense;
};

/// Holds the closed set of top-level accounts plus any per-holding
/// sub-accounts minted by [`holding_account`].
pub struct ChartOfAccounts {
    accounts: std::collections::HashMap<AccountCode, Account>,
}

impl ChartOfAccounts {
    /// Builds the standard chart used by every user; there is no
    /// per-user customization of the top-level accounts.
    pub fn standard() -> Self {
        let mut accounts = std::collections::HashMap::new();
        for (code, name, account_type) in STANDARD_ACCOUNTS {
            accounts.insert(
                AccountCode::new(*code),
                Account {
                    code: AccountCode::new(*code),
                    name,
                    account_type: *account_type,
                },
            );
        }
        ChartOfAccounts { accounts }
    }

    pub fn get(&self, code: &AccountCode) -> Option<&Account> {
        self.accounts.get(code)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn contains(&self, code: &AccountCode) -> bool {
        self.accounts.contains_key(code)
    }
}

/// Derives the per-holding sub-account code under a base holding
/// account, e.g. `holding_account("1203", "INFY") == "1203:INFY"`. The
/// base code must name one of the holding accounts in
/// [`STANDARD_ACCOUNTS`]; per-symbol sub-accounts are not registered in
/// the chart itself, only in the ledger's journal-entry account_code
/// column, matching how the cost-basis tracker keys its lots.
pub fn holding_account(base_code: &str, symbol: &str) -> AccountCode {
    AccountCode::new(format!("{base_code}:{symbol}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_chart_has_every_account_type() {
        let coa = ChartOfAccounts::standard();
        assert!(coa.account_count() >= 20);
        assert!(coa.get(&AccountCode::new("1101")).is_some());
        assert_eq!(
            coa.get(&AccountCode::new("4201")).unwrap().account_type,
            AccountType::Income
        );
    }

    #[test]
    fn holding_account_namespaces_by_symbol() {
        let code = holding_account("1203", "INFY");
        assert_eq!(code.0, "1203:INFY");
    }
}
