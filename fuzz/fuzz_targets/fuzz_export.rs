#![no_main]

use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;
use notafiscal::core::EngineConfig;
use notafiscal::report::{COLUMNS, export_row, to_csv};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let Some(records) = notafiscal::parse::parse_fiscal_xml(s, "fuzz.xml", &EngineConfig::default())
        else {
            return;
        };
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        for record in &records {
            assert_eq!(export_row(record, today).len(), COLUMNS.len());
        }
        let _ = to_csv(&records, today);
    }
});
