//! The neutral record shapes every parser emits (§4.5), and the
//! `ParseResult` envelope carrying them plus per-file/per-row
//! diagnostics. Parsers never touch the store — the batch ingester
//! (`ledger-ingest`) is the only thing that turns these into writes.

use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum TxnTypeHint {
    Purchase,
    Redemption,
    SwitchIn,
    SwitchOut,
    Dividend,
    DividendReinvest,
    Buy,
    Sell,
    Deposit,
    Withdrawal,
    Interest,
    Fee,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MfTransactionRecord {
    pub folio: String,
    pub scheme: String,
    pub isin: Option<String>,
    pub txn_date: NaiveDate,
    pub txn_type: TxnTypeHint,
    pub units: Decimal,
    pub nav: Option<Decimal>,
    pub amount: Decimal,
    pub purchase_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockTradeRecord {
    pub symbol: String,
    pub isin: Option<String>,
    pub trade_date: NaiveDate,
    pub trade_type: TxnTypeHint,
    pub quantity: Decimal,
    pub price: Decimal,
    pub purchase_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PpfTransactionRecord {
    pub account_number: String,
    pub txn_date: NaiveDate,
    pub amount: Decimal,
    pub txn_type: TxnTypeHint,
    pub balance_after: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BankTransactionRecord {
    pub bank: String,
    pub account_number: Option<String>,
    pub txn_date: NaiveDate,
    pub raw_description: String,
    pub amount: Decimal,
    pub balance_after: Option<Decimal>,
    pub natural_key_hash: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoldenHoldingRecord {
    pub isin: Option<String>,
    pub folio_number: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub units_or_quantity: Decimal,
    pub value: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRecord {
    MfTransaction(MfTransactionRecord),
    StockTrade(StockTradeRecord),
    PpfTransaction(PpfTransactionRecord),
    BankTransaction(BankTransactionRecord),
    GoldenHolding(GoldenHoldingRecord),
}

#[derive(Debug, Clone)]
pub struct ParseResult {
    pub success: bool,
    pub source_file: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub records: Vec<ParsedRecord>,
}

impl ParseResult {
    pub fn empty(source_file: impl Into<String>) -> Self {
        ParseResult {
            success: true,
            source_file: source_file.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn failed(source_file: impl Into<String>, error: impl Into<String>) -> Self {
        ParseResult {
            success: false,
            source_file: source_file.into(),
            errors: vec![error.into()],
            warnings: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
        self.success = false;
    }
}
