#![no_main]

use libfuzzer_sys::fuzz_target;
use notafiscal::core::EngineConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let config = EngineConfig::default().with_own_company("05255986000164");
        let _ = notafiscal::parse::try_parse_fiscal_xml(s, "fuzz.xml", &config);
    }
});
