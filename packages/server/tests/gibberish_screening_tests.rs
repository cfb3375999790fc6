//! Gibberish screening against realistic inputs.

use scoring_core::domains::content::gibberish;

#[test]
fn keyboard_mash_is_rejected_with_no_side_effects_needed() {
    // The canonical mashed-keyboard submission
    assert!(gibberish::detect("asdfghjkl qwerty zxcvbn").is_some());
    assert!(gibberish::detect("qazwsx edc rfvtgb").is_some());
}

#[test]
fn plausible_posts_pass() {
    let posts = [
        "Thoughtful essay about consensus algorithms.",
        "Just returned from a breathtaking trip to the coast. The deep blue of the \
         ocean was mesmerizing and the sunsets were unforgettable.",
        "This is a brand new post about a sunset, submitted via the API.",
        "Sharing my first attempt at sourdough. The crumb turned out better than expected!",
    ];

    for post in posts {
        assert!(gibberish::detect(post).is_none(), "rejected: {}", post);
    }
}

#[test]
fn short_but_meaningful_text_passes() {
    assert!(gibberish::detect("a tree").is_none());
    assert!(gibberish::detect("nice work").is_none());
}

#[test]
fn degenerate_inputs_are_rejected() {
    // Too short
    assert!(gibberish::detect("ok").is_some());
    // One repeated character
    assert!(gibberish::detect("aaaaaaaaaa").is_some());
    // Consonant soup
    assert!(gibberish::detect("xkcd vwls bcdfghj klmnpqrst").is_some());
}

#[test]
fn rejection_reasons_are_stable_strings() {
    let reason = gibberish::detect("asdfghjkl qwerty zxcvbn").unwrap();
    assert_eq!(reason, "keyboard pattern");
}
