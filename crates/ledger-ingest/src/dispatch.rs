//! Maps a file to the parser that should read it (§4.6: `dispatch(file.extension)`),
//! extended past bare extension the way the original inbox scanner resolved
//! the RTA for mutual-fund statements: folder name first, then byte-pattern
//! content sniffing as a fallback, only for the formats extension alone
//! can't disambiguate (CAMS/Karvy both ship `.xlsx`/`.pdf`).

use std::fs;
use std::path::Path;

/// Which format parser a file should be routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Cams,
    Karvy,
    Zerodha,
    Icici,
    NsdlCas,
    Ppf,
    Bank,
}

const CAMS_PATTERNS: &[&[u8]] = &[
    b"Computer Age Management Services",
    b"CAMS",
    b"www.camsonline.com",
];

const KARVY_PATTERNS: &[&[u8]] = &[b"KFin Technologies", b"Karvy", b"KFINTECH", b"www.kfintech.com"];

fn path_names_upper(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| c.as_os_str().to_str())
        .map(|s| s.to_uppercase())
        .collect()
}

/// Folder-name-first, content-sniffing-fallback RTA detection for an MF
/// statement file, mirroring the original scanner's two-stage approach.
/// Returns `None` when neither stage can tell CAMS from Karvy — the
/// caller should fall back to an explicit hint (e.g. the folder the
/// batch was invoked against) rather than guess.
pub fn detect_mf_rta(path: &Path) -> Option<Format> {
    let parts = path_names_upper(path);
    if parts.iter().any(|p| p == "CAMS") {
        return Some(Format::Cams);
    }
    if parts.iter().any(|p| p == "KARVY" || p == "KFINTECH") {
        return Some(Format::Karvy);
    }

    let Ok(bytes) = fs::read(path) else { return None };
    if CAMS_PATTERNS.iter().any(|p| contains(&bytes, p)) {
        return Some(Format::Cams);
    }
    if KARVY_PATTERNS.iter().any(|p| contains(&bytes, p)) {
        return Some(Format::Karvy);
    }
    None
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len().max(1)).any(|w| w == needle)
}

/// An explicit hint a caller can supply for formats extension and
/// content-sniffing can't resolve on their own (Zerodha vs. ICICI vs.
/// plain bank CSV are all plausible for the same `.csv`/`.xlsx` file).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceHint {
    MutualFund,
    ZerodhaTaxPnl,
    IciciCapitalGains,
    NsdlCas,
    Ppf,
    Bank,
}

/// Resolves the format to parse `path` with, given the caller's hint
/// about which directory/import flow it came through. Mutual-fund files
/// still need RTA detection since CAMS and Karvy share extensions.
pub fn resolve_format(path: &Path, hint: SourceHint) -> Option<Format> {
    match hint {
        SourceHint::MutualFund => detect_mf_rta(path),
        SourceHint::ZerodhaTaxPnl => Some(Format::Zerodha),
        SourceHint::IciciCapitalGains => Some(Format::Icici),
        SourceHint::NsdlCas => Some(Format::NsdlCas),
        SourceHint::Ppf => Some(Format::Ppf),
        SourceHint::Bank => Some(Format::Bank),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn folder_name_wins_over_content() {
        let dir = tempfile::Builder::new().prefix("CAMS").tempdir().unwrap();
        let path = dir.path().join("statement.xlsx");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "KFin Technologies").unwrap();

        assert_eq!(detect_mf_rta(&path), Some(Format::Cams));
    }

    #[test]
    fn falls_back_to_content_sniffing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.xlsx");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "issued by KFin Technologies on behalf of the fund").unwrap();

        assert_eq!(detect_mf_rta(&path), Some(Format::Karvy));
    }

    #[test]
    fn unrecognized_content_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.xlsx");
        fs::File::create(&path).unwrap().write_all(b"nothing recognizable here").unwrap();

        assert_eq!(detect_mf_rta(&path), None);
    }
}
