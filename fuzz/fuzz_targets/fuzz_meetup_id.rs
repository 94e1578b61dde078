// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for meetup id parsing.
// Run with: cargo +nightly fuzz run fuzz_meetup_id

#![no_main]

use libfuzzer_sys::fuzz_target;
use meetup_store::MeetupId;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Anything that parses must print back to the same lowercase hex.
        if let Ok(id) = MeetupId::parse(s) {
            assert_eq!(id.to_hex(), s.to_ascii_lowercase());
            assert_eq!(MeetupId::parse(&id.to_hex()).ok(), Some(id));
        }
    }
});
