//! NSDL Consolidated Account Statement (CAS) parser — the golden-
//! reference source for §4.10's Cross Correlator. Grounded on
//! `examples/original_source/src/pfas/services/golden_reference/nsdl_cas_parser.py`:
//! section detection by header regex (`EQUITY`/`MUTUAL FUND FOLIOS`/
//! `SOVEREIGN GOLD BONDS (SGB)`/`NATIONAL PENSION SYSTEM (NPS) HOLDING
//! DETAILS`), per-line ISIN + trailing-numbers extraction
//! (`_parse_equity_line`'s "last number is market value,
//! second-to-last is price, first whole-number-shaped number before
//! those is quantity" heuristic), and the SGB/NPS line parsers
//! (`_parse_sgb_line`, the `PFM-Scheme Name | Units | NAV | Value` regex
//! in `_extract_nps_holdings`). The duplicated-character extraction
//! artifact (`NNaattiioonnaall` -> `National`) this source PDF is prone
//! to is repaired earlier, in [`crate::pdf::PdfDocument::open`], before
//! any of these section regexes ever see the text.
//! Natural key `(golden_ref_id, isin, folio_number)` per §4.5's table.

use std::path::Path;

use ledger_domain::LedgerResult;
use regex::Regex;
use rust_decimal::Decimal;

use crate::pdf::PdfDocument;
use crate::result::{GoldenHoldingRecord, ParseResult, ParsedRecord};

fn isin_pattern() -> Regex {
    Regex::new(r"IN[A-Z0-9]{10}").expect("valid regex")
}

/// Matches both the statement's actual header ("Equities (E)") and the
/// "Equity Holdings" wording the original golden-reference parser also
/// accepted.
fn equity_section_pattern() -> Regex {
    Regex::new(r"(?i)equit(?:y\s+holdings?|ies\s*\(e\))").expect("valid regex")
}

fn mf_section_pattern() -> Regex {
    Regex::new(r"(?i)mutual\s+fund\s+folios?").expect("valid regex")
}

fn sgb_section_pattern() -> Regex {
    Regex::new(r"(?i)sovereign\s+gold\s+bonds?\s*\(sgb\)").expect("valid regex")
}

fn nps_section_pattern() -> Regex {
    Regex::new(r"(?i)national\s+pension\s+system\s*\(nps\)\s*holding\s+details").expect("valid regex")
}

/// SGB ISINs are government-security ISINs, always `IN00...` rather
/// than the `IN[A-Z]...` corporate-issuer shape ordinary equities use.
fn sgb_isin_pattern() -> Regex {
    Regex::new(r"^IN00\d{8}").expect("valid regex")
}

/// `PFM-Scheme Name | Units | Current NAV | Current Value`, tier-wise
/// NPS pension fund manager scheme lines.
fn nps_line_pattern() -> Regex {
    Regex::new(r"(?i)([A-Za-z][A-Za-z\s]+SCHEME\s+[ECG]\s*-\s*TIER\s+I+)\s+([\d,]+\.?\d*)\s+([\d,]+\.?\d*)\s+([\d,]+\.?\d*)")
        .expect("valid regex")
}

fn numbers_pattern() -> Regex {
    Regex::new(r"[\d,]+\.?\d*").expect("valid regex")
}

fn parse_amount(raw: &str) -> Option<Decimal> {
    raw.replace(',', "").parse::<Decimal>().ok()
}

/// Parses one line known to contain an ISIN into a holding, using the
/// "last number is value, second-to-last is price, a small whole
/// number before those is quantity" heuristic from the original.
fn parse_holding_line(isin: &str, line: &str) -> Option<GoldenHoldingRecord> {
    let after_isin = line.splitn(2, isin).nth(1).unwrap_or("");
    let numbers: Vec<Decimal> = numbers_pattern().find_iter(after_isin).filter_map(|m| parse_amount(m.as_str())).collect();
    if numbers.len() < 3 {
        return None;
    }

    let name_match = Regex::new(r"^([A-Za-z\s\-.&()]+)").ok()?.captures(after_isin.trim_start());
    let name = name_match.and_then(|c| c.get(1)).map(|m| m.as_str().trim().to_string());

    let value = *numbers.last()?;
    if value < Decimal::ONE {
        return None;
    }

    // Quantity is usually a whole-number share/unit count appearing
    // before the trailing price/value pair; fall back to the last
    // reasonably-sized positive number seen if none is exactly whole.
    let candidates = &numbers[..numbers.len() - 2];
    let mut quantity = Decimal::ZERO;
    for candidate in candidates {
        if *candidate > Decimal::ZERO && *candidate < Decimal::from(1_000_000) {
            if candidate.fract().is_zero() {
                quantity = *candidate;
                break;
            }
            quantity = *candidate;
        }
    }

    Some(GoldenHoldingRecord {
        isin: Some(isin.to_string()),
        folio_number: None,
        symbol: None,
        name,
        units_or_quantity: quantity,
        value: Some(value),
    })
}

/// Parses one SGB line: `ISIN Name Coupon% MaturityDate Units FaceValue
/// MarketPrice Value`. Only the ISIN's fixed position is trusted; the
/// four trailing numbers are taken positionally from the right, same
/// heuristic the equity/MF line parser uses, since the coupon rate and
/// maturity date in between aren't needed for reconciliation.
fn parse_sgb_line(isin: &str, line: &str) -> Option<GoldenHoldingRecord> {
    let after_isin = line.splitn(2, isin).nth(1).unwrap_or("");
    let numbers: Vec<Decimal> = numbers_pattern().find_iter(after_isin).filter_map(|m| parse_amount(m.as_str())).collect();
    if numbers.len() < 4 {
        return None;
    }

    let name_match = Regex::new(r"^([A-Za-z\s\-]+)").ok()?.captures(after_isin.trim_start());
    let name = name_match
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());

    let n = numbers.len();
    let units = numbers[n - 4];
    let value = numbers[n - 1];

    Some(GoldenHoldingRecord {
        isin: Some(isin.to_string()),
        folio_number: None,
        symbol: None,
        name,
        units_or_quantity: units,
        value: Some(value),
    })
}

fn collect_sgb_holdings(section_text: &str, result: &mut ParseResult) {
    let isin_re = sgb_isin_pattern();
    for line in section_text.lines() {
        let trimmed = line.trim_start();
        let Some(m) = isin_re.find(trimmed) else { continue };
        match parse_sgb_line(m.as_str(), trimmed) {
            Some(holding) => result.records.push(ParsedRecord::GoldenHolding(holding)),
            None => result.add_warning(format!("could not parse SGB holding line: {line}")),
        }
    }
}

fn collect_nps_holdings(section_text: &str, result: &mut ParseResult) {
    for captures in nps_line_pattern().captures_iter(section_text) {
        let scheme_name = captures.get(1).map(|m| m.as_str().trim().to_string());
        let Some(units) = captures.get(2).and_then(|m| parse_amount(m.as_str())) else { continue };
        let Some(value) = captures.get(4).and_then(|m| parse_amount(m.as_str())) else { continue };
        if units.is_zero() {
            continue;
        }
        result.records.push(ParsedRecord::GoldenHolding(GoldenHoldingRecord {
            isin: None,
            folio_number: None,
            symbol: None,
            name: scheme_name,
            units_or_quantity: units,
            value: Some(value),
        }));
    }
}

fn extract_section<'a>(text: &'a str, section: &Regex, next_sections: &[Regex]) -> Option<&'a str> {
    let start = section.find(text)?.end();
    let mut end = text.len();
    for next in next_sections {
        if let Some(m) = next.find(&text[start..]) {
            end = end.min(start + m.start());
        }
    }
    Some(&text[start..end])
}

pub fn parse(path: &Path, password: Option<&str>) -> LedgerResult<ParseResult> {
    let source = path.display().to_string();
    let doc = match PdfDocument::open(path, password) {
        Ok(doc) => doc,
        Err(e) => return Ok(ParseResult::failed(source, format!("failed to open NSDL CAS PDF: {e}"))),
    };
    let text = doc.full_text();
    let isin_re = isin_pattern();

    let mut result = ParseResult::empty(source);

    let equity_re = equity_section_pattern();
    let mf_re = mf_section_pattern();
    let sgb_re = sgb_section_pattern();
    let nps_re = nps_section_pattern();

    if let Some(section) = extract_section(&text, &equity_re, &[mf_re.clone(), sgb_re.clone(), nps_re.clone()]) {
        collect_holdings(section, &isin_re, &mut result);
    }
    if let Some(section) = extract_section(&text, &mf_re, &[sgb_re.clone(), nps_re.clone()]) {
        collect_holdings(section, &isin_re, &mut result);
    }
    if let Some(section) = extract_section(&text, &sgb_re, &[nps_re.clone()]) {
        collect_sgb_holdings(section, &mut result);
    }
    if let Some(section) = extract_section(&text, &nps_re, &[]) {
        collect_nps_holdings(section, &mut result);
    }

    if result.records.is_empty() {
        result.add_warning("no equity/MF/SGB/NPS holdings recognized in statement");
    }
    Ok(result)
}

fn collect_holdings(section_text: &str, isin_re: &Regex, result: &mut ParseResult) {
    for line in section_text.lines() {
        let Some(m) = isin_re.find(line) else { continue };
        match parse_holding_line(m.as_str(), line) {
            Some(holding) => result.records.push(ParsedRecord::GoldenHolding(holding)),
            None => result.add_warning(format!("could not parse holding line: {line}")),
        }
    }
}
