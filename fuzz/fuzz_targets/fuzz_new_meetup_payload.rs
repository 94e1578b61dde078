// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for create-endpoint payloads.
// Run with: cargo +nightly fuzz run fuzz_new_meetup_payload

#![no_main]

use libfuzzer_sys::fuzz_target;
use meetup_store::NewMeetup;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 {
        return;
    }
    // Decoding and validation reject bad input with errors, never panics.
    if let Ok(meetup) = serde_json::from_slice::<NewMeetup>(data) {
        let _ = meetup.validate();
    }
});
