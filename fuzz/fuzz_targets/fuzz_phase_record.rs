//! Fuzz target: `photoperiod::parse_record`
//!
//! Feeds arbitrary text to the phase record parser and checks that any
//! record it accepts survives validation without panicking and renders
//! back to text that parses to the same record.
//!
//! cargo fuzz run fuzz_phase_record

#![no_main]

use libfuzzer_sys::fuzz_target;
use photoreactor::photoperiod::parse_record;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(record) = parse_record(text) else {
        return;
    };

    let _ = record.validate();
    let _ = record.light_on_at(3600.0);

    let again = parse_record(&record.to_string()).expect("rendered record must parse");
    assert_eq!(again, record);
});
