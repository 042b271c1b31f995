//! Integration tests for the JSON snapshot provider.

use fairval_data::{DataError, FundamentalsProvider, JsonFileProvider};
use std::fs;

const SNAPSHOTS: &str = r#"[
    {
        "ticker": "ASML.AS",
        "name": "ASML Holding",
        "sector_hint": "4520",
        "free_cash_flow": 9.5e9,
        "shares_outstanding": 3.93e8,
        "beta": 1.1,
        "net_debt": -3.0e9,
        "growth_rate": 0.12
    },
    {
        "ticker": "INGA.AS",
        "sector_hint": "4010",
        "net_income": 7.3e9,
        "book_value_per_share": 15.2,
        "shares_outstanding": 3.3e9,
        "sector_median_pe": 9.5
    },
    {
        "ticker": "BROKEN.AS",
        "shares_outstanding": -1.0
    }
]"#;

#[test]
fn test_open_and_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshots.json");
    fs::write(&path, SNAPSHOTS).unwrap();

    let provider = JsonFileProvider::open(&path).unwrap();
    assert_eq!(provider.path(), path.as_path());
    assert_eq!(provider.tickers().len(), 3);

    let asml = provider.fetch("ASML.AS").unwrap();
    assert_eq!(asml.name.as_deref(), Some("ASML Holding"));
    assert_eq!(asml.growth_rate, Some(0.12));

    let ing = provider.fetch("INGA.AS").unwrap();
    assert!(ing.free_cash_flow.is_none());
    assert_eq!(ing.sector_hint.as_deref(), Some("4010"));
}

#[test]
fn test_invalid_entry_fails_only_its_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshots.json");
    fs::write(&path, SNAPSHOTS).unwrap();

    let provider = JsonFileProvider::open(&path).unwrap();
    assert!(matches!(
        provider.fetch("BROKEN.AS"),
        Err(DataError::InvalidSnapshot { .. })
    ));
    assert!(provider.fetch("ASML.AS").is_ok());
}

#[test]
fn test_malformed_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshots.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        JsonFileProvider::open(&path),
        Err(DataError::Serialization(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        JsonFileProvider::open(dir.path().join("absent.json")),
        Err(DataError::Io(_))
    ));
}
