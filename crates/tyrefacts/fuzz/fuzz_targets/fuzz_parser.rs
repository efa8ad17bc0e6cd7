//! Fuzz target for the delimited-file parser.
//!
//! The parser must never panic on malformed input, whatever the delimiter,
//! quoting or encoding, and every table it returns must be rectangular.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Write;
use tyrefacts::input::Parser;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    if let Ok(mut temp_file) = tempfile::NamedTempFile::with_suffix(".csv") {
        if temp_file.write_all(data).is_ok() {
            if let Ok((table, metadata)) = Parser::new().parse_file(temp_file.path()) {
                assert_eq!(metadata.row_count, table.row_count());
                assert!(table.rows.iter().all(|r| r.len() == table.column_count()));
            }
        }
    }
});
