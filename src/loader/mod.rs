//! Ticker universes: built-in lists and constituent CSV files.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Watch list shown on the dashboard.
const FOCUS_TICKERS: &[&str] = &[
    "AIA", "ALL", "AMC", "ANZ", "APA", "ASX", "BHP", "BSL", "BXB", "CBA", "COH", "COL", "CSL",
    "DXS", "FMG", "FPH", "GMG", "IAG", "JHX", "MGR", "MQG", "NAB", "NCM", "NST", "QBE", "REA",
    "REH", "RHC", "RIO", "RMD", "S32", "SCG", "SEK", "SGP", "SHL", "STO", "SUN", "SYD", "TAH",
    "TCL", "TLS", "TPG", "WBC", "WES", "WOW", "WPL", "WTC", "XRO", "ALD", "MIN",
];

/// Large-cap ASX names the benchmark pool is ranked from.
const BENCHMARK_UNIVERSE: &[&str] = &[
    "A2M", "ABB", "AGL", "AIA", "AKE", "ALD", "ALL", "ALQ", "ALU", "ALX", "AMC", "AMP", "ANN",
    "ANZ", "APA", "APE", "ARB", "ARF", "ASX", "AUB", "AZJ", "BAP", "BEN", "BGA", "BHP", "BKW",
    "BOQ", "BPT", "BRG", "BSL", "BWP", "BXB", "CAR", "CBA", "CCP", "CGF", "CHC", "CIA", "CIP",
    "CKF", "CLW", "CMW", "CNU", "COH", "COL", "CPU", "CQR", "CRN", "CSL", "CTD", "CWY", "DEG",
    "DMP", "DOW", "DRR", "DXS", "EDV", "ELD", "EVN", "EVT", "FLT", "FMG", "FPH", "GMG", "GNC",
    "GOZ", "GPT", "GQG", "HDN", "HLS", "HMC", "HUB", "HVN", "IAG", "IEL", "IFL", "IGO", "ILU",
    "INA", "IPL", "IRE", "JBH", "JHX", "LLC", "LNK", "LTR", "LYC", "MFG", "MGR", "MIN", "MP1",
    "MPL", "MQG", "MTS", "NAB", "NEC", "NHF", "NIC", "NSR", "NST", "NWL", "NWS", "NXT", "ORA",
    "ORG", "ORI", "PDN", "PLS", "PME", "PMV", "PNI", "PPT", "PRU", "QAN", "QBE", "QUB", "REA",
    "REH", "RHC", "RIO", "RMD", "RRL", "RWC", "S32", "SCG", "SDF", "SEK", "SFR", "SGM", "SGP",
    "SGR", "SHL", "SOL", "SPK", "STO", "SUL", "SUN", "SVW", "TAH", "TCL", "TLC", "TLS", "TLX",
    "TNE", "TPG", "TWE", "VCX", "VEA", "WBC", "WDS", "WEB", "WES", "WHC", "WOR", "WOW", "WTC",
    "XRO", "YAL", "ZIP",
];

/// Headers recognised as the ticker column, case-insensitive.
const TICKER_HEADERS: &[&str] = &["code", "ticker", "symbol", "asx code"];

pub fn default_focus_tickers() -> Vec<String> {
    FOCUS_TICKERS.iter().map(|s| s.to_string()).collect()
}

pub fn default_benchmark_universe() -> Vec<String> {
    BENCHMARK_UNIVERSE.iter().map(|s| s.to_string()).collect()
}

/// Read tickers from any CSV source. Uses the column headed Code/Ticker/Symbol
/// when there is one, else the first column.
pub fn parse_ticker_list<R: Read>(rdr: R) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let column = reader
        .headers()
        .context("Missing CSV header row")?
        .iter()
        .position(|h| TICKER_HEADERS.contains(&h.to_lowercase().as_str()))
        .unwrap_or(0);
    debug!("Ticker column index: {}", column);

    let mut tickers = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Row {}: {}", i + 1, e);
                continue;
            }
        };
        match record.get(column) {
            Some(t) if !t.is_empty() => tickers.push(t.to_string()),
            _ => {}
        }
    }
    Ok(tickers)
}

pub fn load_ticker_list(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open ticker list {:?}", path))?;
    let tickers =
        parse_ticker_list(file).with_context(|| format!("Failed to parse {:?}", path))?;
    info!("{} tickers loaded from {:?}", tickers.len(), path);
    Ok(tickers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uses_code_column() {
        let csv = "Name,Code,Sector\nBHP Group,BHP,Materials\nCommonwealth Bank, CBA ,Financials\n,,\n";
        let tickers = parse_ticker_list(csv.as_bytes()).unwrap();
        assert_eq!(tickers, vec!["BHP", "CBA"]);
    }

    #[test]
    fn test_parse_defaults_to_first_column() {
        let csv = "Company\nWES.AX\nWOW.AX\n";
        assert_eq!(parse_ticker_list(csv.as_bytes()).unwrap(), vec!["WES.AX", "WOW.AX"]);
    }

    #[test]
    fn test_built_in_lists() {
        assert_eq!(default_focus_tickers().len(), 50);
        assert!(default_benchmark_universe().len() > default_focus_tickers().len());
    }
}
