//! Unit tests for transport helpers

use claude_courier::transport::{MESSAGE_LIMIT, strip_mentions};

#[test]
fn mentions_are_stripped_and_text_trimmed() {
    assert_eq!(strip_mentions("<@123456> fix the bug"), "fix the bug");
    assert_eq!(strip_mentions("fix <@!99> the bug"), "fix  the bug");
    assert_eq!(strip_mentions("  <@1><@!2>  "), "");
}

#[test]
fn plain_text_passes_through() {
    assert_eq!(strip_mentions("run the tests"), "run the tests");
    assert_eq!(strip_mentions("a < b and c > d"), "a < b and c > d");
}

#[test]
fn transport_limit_matches_the_status_contract() {
    assert_eq!(MESSAGE_LIMIT, 2000);
}
