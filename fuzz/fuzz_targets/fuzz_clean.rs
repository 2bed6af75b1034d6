#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let cleaned = notafiscal::parse::clean_xml_content(s);
        // Control characters never survive cleaning.
        assert!(!cleaned.contains('\u{0}'));
    }
});
