//! Fuzz target: `console::parse_line`
//!
//! Feeds arbitrary text to the console grammar and asserts that it never
//! panics and that accepted passcode values are the trimmed tail of the
//! line.
//!
//! cargo fuzz run fuzz_console_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use tamperwatch::adapters::console::parse_line;
use tamperwatch::app::commands::AppCommand;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };

    match parse_line(line) {
        Ok(AppCommand::SetPasscode(value)) => {
            assert!(!value.is_empty(), "set requires a value");
            assert_eq!(value.trim(), value);
            assert!(line.trim_end().ends_with(value.as_str()));
        }
        Ok(AppCommand::SubmitPasscode(_, attempt)) => {
            assert_eq!(attempt.trim(), attempt);
            assert!(line.trim_end().ends_with(attempt.as_str()));
        }
        Ok(_) | Err(_) => {}
    }
});
