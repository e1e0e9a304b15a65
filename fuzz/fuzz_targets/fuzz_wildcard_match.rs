//! Fuzz target for action and resource wildcard matching.
//!
//! Goal: matching should **never panic**, and a pattern made of the text itself, or of a
//! lone `*`, must always match.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_wildcard_match
//! ```

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use scpguard_domain::wildcard_match;

#[derive(Arbitrary, Debug)]
struct MatchInput {
    pattern: String,
    text: String,
}

fuzz_target!(|input: MatchInput| {
    if input.pattern.len() > 512 || input.text.len() > 4096 {
        return;
    }

    let _ = wildcard_match(&input.pattern, &input.text);
    assert!(wildcard_match("*", &input.text));
    if !input.text.contains('*') {
        assert!(wildcard_match(&input.text, &input.text));
    }
});
