//! Forward-only, idempotent schema migrations.
//!
//! Every statement uses `CREATE TABLE IF NOT EXISTS` / `CREATE INDEX IF NOT
//! EXISTS` so re-running a migration (e.g. on an already-current database)
//! is a no-op, matching §4.1's "migrations are idempotent and
//! forward-only". Migrations are applied in order and recorded in
//! `schema_migrations`; a version already recorded there is skipped.

/// One migration: a monotonically increasing version and the SQL batch to
/// apply at that version.
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "core_ledger",
        sql: r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            created_at TEXT NOT NULL,
            soft_deleted INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS accounts (
            code TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            account_type TEXT NOT NULL,
            parent_code TEXT REFERENCES accounts(code)
        );

        CREATE TABLE IF NOT EXISTS journals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            txn_date TEXT NOT NULL,
            description TEXT NOT NULL,
            source TEXT NOT NULL,
            idempotency_key TEXT NOT NULL,
            reference_type TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(user_id, idempotency_key)
        );

        CREATE TABLE IF NOT EXISTS journal_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            journal_id INTEGER NOT NULL REFERENCES journals(id),
            account_code TEXT NOT NULL REFERENCES accounts(code),
            debit TEXT NOT NULL,
            credit TEXT NOT NULL,
            narration TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_journal_entries_journal ON journal_entries(journal_id);
        CREATE INDEX IF NOT EXISTS idx_journal_entries_account ON journal_entries(account_code);

        CREATE TABLE IF NOT EXISTS cost_basis_lots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            asset_type TEXT NOT NULL,
            symbol TEXT NOT NULL,
            acquisition_date TEXT NOT NULL,
            units_acquired TEXT NOT NULL,
            units_remaining TEXT NOT NULL,
            cost_per_unit TEXT NOT NULL,
            total_cost TEXT NOT NULL,
            currency TEXT NOT NULL,
            reference TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_lots_key
            ON cost_basis_lots(user_id, asset_type, symbol, acquisition_date);

        CREATE TABLE IF NOT EXISTS processed_files (
            file_hash TEXT NOT NULL,
            user_id INTEGER NOT NULL,
            batch_id TEXT NOT NULL,
            parser TEXT NOT NULL,
            records_count INTEGER NOT NULL,
            status TEXT NOT NULL,
            processed_at TEXT NOT NULL,
            PRIMARY KEY (user_id, file_hash)
        );

        CREATE TABLE IF NOT EXISTS batch_runs (
            batch_id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            files_count INTEGER NOT NULL,
            records_count INTEGER NOT NULL,
            status TEXT NOT NULL,
            started_at TEXT NOT NULL,
            completed_at TEXT
        );

        CREATE TABLE IF NOT EXISTS audit_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            table_name TEXT NOT NULL,
            record_id TEXT NOT NULL,
            action TEXT NOT NULL,
            old_values TEXT,
            new_values TEXT,
            source TEXT NOT NULL,
            at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_audit_user_table ON audit_log(user_id, table_name);
        "#,
    },
    Migration {
        version: 2,
        name: "asset_rows",
        sql: r#"
        CREATE TABLE IF NOT EXISTS mf_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            journal_id INTEGER REFERENCES journals(id),
            folio TEXT NOT NULL,
            scheme TEXT NOT NULL,
            txn_date TEXT NOT NULL,
            amount TEXT NOT NULL,
            units TEXT NOT NULL,
            txn_type TEXT NOT NULL,
            nav TEXT,
            source TEXT NOT NULL,
            UNIQUE(user_id, folio, scheme, txn_date, amount, units, txn_type)
        );

        CREATE TABLE IF NOT EXISTS stock_trades (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            journal_id INTEGER REFERENCES journals(id),
            symbol TEXT NOT NULL,
            trade_date TEXT NOT NULL,
            trade_type TEXT NOT NULL,
            quantity TEXT NOT NULL,
            price TEXT NOT NULL,
            purchase_date TEXT,
            source TEXT NOT NULL,
            UNIQUE(user_id, symbol, trade_date, trade_type, quantity, price)
        );

        CREATE TABLE IF NOT EXISTS rsu_vests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            journal_id INTEGER REFERENCES journals(id),
            symbol TEXT NOT NULL,
            vest_date TEXT NOT NULL,
            quantity TEXT NOT NULL,
            fmv_per_share TEXT NOT NULL,
            currency TEXT NOT NULL,
            source TEXT NOT NULL,
            UNIQUE(user_id, symbol, vest_date, quantity)
        );

        CREATE TABLE IF NOT EXISTS espp_purchases (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            journal_id INTEGER REFERENCES journals(id),
            symbol TEXT NOT NULL,
            purchase_date TEXT NOT NULL,
            quantity TEXT NOT NULL,
            purchase_price TEXT NOT NULL,
            fmv_per_share TEXT NOT NULL,
            currency TEXT NOT NULL,
            source TEXT NOT NULL,
            UNIQUE(user_id, symbol, purchase_date, quantity)
        );

        CREATE TABLE IF NOT EXISTS ppf_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            journal_id INTEGER REFERENCES journals(id),
            account_number TEXT NOT NULL,
            txn_date TEXT NOT NULL,
            amount TEXT NOT NULL,
            txn_type TEXT NOT NULL,
            balance_after TEXT,
            source TEXT NOT NULL,
            UNIQUE(user_id, account_number, txn_date, amount, txn_type)
        );

        CREATE TABLE IF NOT EXISTS epf_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            journal_id INTEGER REFERENCES journals(id),
            account_number TEXT NOT NULL,
            txn_date TEXT NOT NULL,
            amount TEXT NOT NULL,
            txn_type TEXT NOT NULL,
            balance_after TEXT,
            source TEXT NOT NULL,
            UNIQUE(user_id, account_number, txn_date, amount, txn_type)
        );

        CREATE TABLE IF NOT EXISTS nps_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            journal_id INTEGER REFERENCES journals(id),
            account_number TEXT NOT NULL,
            txn_date TEXT NOT NULL,
            amount TEXT NOT NULL,
            txn_type TEXT NOT NULL,
            tier TEXT,
            balance_after TEXT,
            source TEXT NOT NULL,
            UNIQUE(user_id, account_number, txn_date, amount, txn_type)
        );

        CREATE TABLE IF NOT EXISTS bank_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            journal_id INTEGER REFERENCES journals(id),
            bank TEXT NOT NULL,
            account_number TEXT,
            txn_date TEXT NOT NULL,
            raw_description TEXT NOT NULL,
            amount TEXT NOT NULL,
            balance_after TEXT,
            natural_key_hash TEXT NOT NULL,
            source TEXT NOT NULL,
            UNIQUE(user_id, natural_key_hash)
        );

        CREATE TABLE IF NOT EXISTS foreign_holdings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            journal_id INTEGER REFERENCES journals(id),
            symbol TEXT NOT NULL,
            as_of_date TEXT NOT NULL,
            quantity TEXT NOT NULL,
            currency TEXT NOT NULL,
            fx_rate_to_inr TEXT,
            source TEXT NOT NULL,
            UNIQUE(user_id, symbol, as_of_date)
        );
        "#,
    },
    Migration {
        version: 3,
        name: "tax_rule_tables",
        sql: r#"
        CREATE TABLE IF NOT EXISTS income_tax_slabs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            financial_year TEXT NOT NULL,
            regime TEXT NOT NULL,
            slab_order INTEGER NOT NULL,
            lower_bound TEXT NOT NULL,
            upper_bound TEXT,
            rate TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_slabs_fy_regime ON income_tax_slabs(financial_year, regime);

        CREATE TABLE IF NOT EXISTS capital_gains_rates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            financial_year TEXT NOT NULL,
            asset_class TEXT NOT NULL,
            term TEXT NOT NULL,
            rate TEXT NOT NULL,
            exemption_limit TEXT NOT NULL DEFAULT '0'
        );
        CREATE INDEX IF NOT EXISTS idx_cg_rates_fy ON capital_gains_rates(financial_year, asset_class, term);

        CREATE TABLE IF NOT EXISTS standard_deductions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            financial_year TEXT NOT NULL,
            regime TEXT NOT NULL,
            income_type TEXT NOT NULL,
            amount TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS surcharge_rates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            financial_year TEXT NOT NULL,
            regime TEXT NOT NULL,
            income_type TEXT NOT NULL,
            lower_bound TEXT NOT NULL,
            upper_bound TEXT,
            rate TEXT NOT NULL,
            rate_cap TEXT
        );

        CREATE TABLE IF NOT EXISTS cess_rates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            financial_year TEXT NOT NULL,
            rate TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rebate_limits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            financial_year TEXT NOT NULL,
            regime TEXT NOT NULL,
            income_cap TEXT NOT NULL,
            max_rebate TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS chapter_via_limits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            financial_year TEXT NOT NULL,
            section TEXT NOT NULL,
            limit_amount TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS dtaa_rates (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            country TEXT NOT NULL,
            income_type TEXT NOT NULL,
            treaty_rate TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_income_summary (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            financial_year TEXT NOT NULL,
            income_type TEXT NOT NULL,
            sub_classification TEXT NOT NULL,
            sub_grouping TEXT NOT NULL,
            gross TEXT NOT NULL,
            deductions TEXT NOT NULL,
            taxable TEXT NOT NULL,
            tds TEXT NOT NULL,
            applicable_tax_rate_type TEXT NOT NULL,
            UNIQUE(user_id, financial_year, income_type, sub_classification, sub_grouping)
        );

        CREATE TABLE IF NOT EXISTS advance_tax_computations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            financial_year TEXT NOT NULL,
            regime TEXT NOT NULL,
            gross_income TEXT NOT NULL,
            taxable_income TEXT NOT NULL,
            slab_tax TEXT NOT NULL,
            special_rate_tax TEXT NOT NULL,
            rebate TEXT NOT NULL,
            surcharge TEXT NOT NULL,
            cess TEXT NOT NULL,
            total_liability TEXT NOT NULL,
            tds_paid TEXT NOT NULL,
            advance_tax_paid TEXT NOT NULL,
            balance_payable TEXT NOT NULL,
            is_latest INTEGER NOT NULL,
            computed_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_advance_tax_user_fy
            ON advance_tax_computations(user_id, financial_year, is_latest);
        "#,
    },
    Migration {
        version: 4,
        name: "golden_reference_and_suspense",
        sql: r#"
        CREATE TABLE IF NOT EXISTS golden_references (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            source TEXT NOT NULL,
            statement_date TEXT NOT NULL,
            imported_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS golden_holdings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            golden_ref_id INTEGER NOT NULL REFERENCES golden_references(id),
            isin TEXT,
            folio_number TEXT,
            symbol TEXT,
            name TEXT,
            quantity TEXT NOT NULL,
            market_value TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_golden_holdings_ref ON golden_holdings(golden_ref_id);

        CREATE TABLE IF NOT EXISTS reconciliation_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            golden_ref_id INTEGER REFERENCES golden_references(id),
            match_key TEXT NOT NULL,
            match_result TEXT NOT NULL,
            severity TEXT NOT NULL,
            system_quantity TEXT,
            golden_quantity TEXT,
            difference TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS suspense_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            reconciliation_event_id INTEGER NOT NULL REFERENCES reconciliation_events(id),
            status TEXT NOT NULL,
            opened_at TEXT NOT NULL,
            resolved_at TEXT,
            resolution_note TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_suspense_status ON suspense_items(user_id, status);

        CREATE TABLE IF NOT EXISTS truth_resolver_overrides (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            metric TEXT NOT NULL,
            asset_class TEXT NOT NULL,
            source_order TEXT NOT NULL,
            UNIQUE(user_id, metric, asset_class)
        );

        CREATE TABLE IF NOT EXISTS balance_sheet_snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            as_of_date TEXT NOT NULL,
            total_assets TEXT NOT NULL,
            total_liabilities TEXT NOT NULL,
            net_worth TEXT NOT NULL,
            detail_json TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(user_id, as_of_date)
        );

        CREATE TABLE IF NOT EXISTS liability_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            journal_id INTEGER REFERENCES journals(id),
            loan_account TEXT NOT NULL,
            txn_date TEXT NOT NULL,
            txn_type TEXT NOT NULL,
            amount TEXT NOT NULL,
            outstanding_after TEXT NOT NULL,
            source TEXT NOT NULL,
            UNIQUE(user_id, loan_account, txn_date, txn_type, amount)
        );
        "#,
    },
    Migration {
        version: 5,
        name: "capital_gains_events",
        sql: r#"
        CREATE TABLE IF NOT EXISTS capital_gains_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            journal_id INTEGER REFERENCES journals(id),
            asset_type TEXT NOT NULL,
            symbol TEXT NOT NULL,
            folio_or_account TEXT,
            sale_date TEXT NOT NULL,
            units TEXT NOT NULL,
            sale_value TEXT NOT NULL,
            cost_basis TEXT NOT NULL,
            gain TEXT NOT NULL,
            term TEXT NOT NULL,
            is_grandfathered INTEGER NOT NULL DEFAULT 0,
            fmv_missing INTEGER NOT NULL DEFAULT 0,
            financial_year TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_cg_events_user_fy
            ON capital_gains_events(user_id, financial_year, asset_type);
        "#,
    },
];
