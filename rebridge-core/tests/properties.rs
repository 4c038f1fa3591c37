//! Property tests for offset translation, negotiation and iteration

use proptest::prelude::*;
use rebridge_core::{
    EncodedView, Encoding, EncodingStrategy, Options, Pattern, PatternBuilder, Region,
    WrappedText,
};
use std::sync::Arc;

/// Always picks one encoding
struct Fixed(Encoding);

impl EncodingStrategy for Fixed {
    fn guess(&self, text: &Arc<str>) -> Option<EncodedView> {
        self.0.encode(Arc::clone(text)).ok()
    }
}

fn any_encoding() -> impl Strategy<Value = Encoding> {
    prop::sample::select(Encoding::ALL.to_vec())
}

fn regions(pattern: &Pattern, subject: &WrappedText) -> Vec<Region> {
    pattern
        .find_iter_wrapped(subject, 0)
        .unwrap()
        .map(|m| m.unwrap().region())
        .collect()
}

proptest! {
    #[test]
    fn offsets_round_trip(text in "[a-z0-9 ]{0,16}", encoding in any_encoding()) {
        let view = encoding.encode(text.as_str()).unwrap();
        for chars in 0..=view.char_len() {
            let bytes = view.char_offset_to_byte_offset(chars);
            prop_assert_eq!(view.byte_offset_to_char_offset(bytes), chars);
        }
        prop_assert_eq!(view.char_offset_to_byte_offset(view.char_len() + 3), view.len());
    }

    #[test]
    fn offsets_round_trip_unicode(text in "\\PC{0,16}", wide in prop::bool::ANY) {
        let encoding = if wide { Encoding::Utf16Be } else { Encoding::Utf8 };
        let view = encoding.encode(text.as_str()).unwrap();
        prop_assert_eq!(view.char_len(), text.chars().count());
        for chars in 0..=view.char_len() {
            let bytes = view.char_offset_to_byte_offset(chars);
            prop_assert_eq!(view.byte_offset_to_char_offset(bytes), chars);
        }
    }

    #[test]
    fn latin1_round_trip(text in "[\\u{20}-\\u{7e}\\u{a0}-\\u{ff}]{0,16}") {
        let view = Encoding::Iso8859_1.encode(text.as_str()).unwrap();
        prop_assert_eq!(view.len(), view.char_len());
        prop_assert_eq!(Encoding::Iso8859_1.decode(view.bytes()).unwrap(), text);
    }

    #[test]
    fn negotiation_picks_highest_rank(
        ours in any_encoding(),
        theirs in any_encoding(),
        text in "[a-z]{0,8}",
    ) {
        let pattern = PatternBuilder::new("a").strategy(Fixed(ours)).build().unwrap();
        let subject = WrappedText::with_native_encoding(text, theirs).unwrap();
        let chosen = pattern.negotiate_encoding(&subject);

        prop_assert_eq!(chosen.rank(), ours.rank().max(theirs.rank()));
        if ours.rank() >= theirs.rank() {
            prop_assert_eq!(chosen, ours);
        } else {
            prop_assert_eq!(chosen, theirs);
        }
    }

    #[test]
    fn find_all_equals_drained_iterator(
        source in prop::sample::select(vec!["a", "a*", "\\w+", "(?:)", "b|\u{e9}", "\\b"]),
        text in "[ab \u{e9}\u{1F600}]{0,12}",
    ) {
        let pattern = Pattern::new(source, Options::NONE).unwrap();
        let collected: Vec<Region> =
            pattern.find_all(&text).unwrap().iter().map(|m| m.region()).collect();
        let drained: Vec<Region> =
            pattern.find_iter(&text).unwrap().map(|m| m.unwrap().region()).collect();
        prop_assert_eq!(collected, drained);
    }

    #[test]
    fn regions_agree_across_encodings(
        source in prop::sample::select(vec!["a+", "x*", "\\w", "\u{1F600}|b"]),
        text in "[ab x\u{e9}\u{1F600}]{0,12}",
        encoding in prop::sample::select(vec![
            Encoding::Utf16Le,
            Encoding::Utf16Be,
            Encoding::Utf32Le,
            Encoding::Utf32Be,
        ]),
    ) {
        let pattern = Pattern::new(source, Options::NONE).unwrap();
        let utf8 = regions(&pattern, &WrappedText::new(text.as_str()));
        let wide = regions(
            &pattern,
            &WrappedText::with_native_encoding(text.as_str(), encoding).unwrap(),
        );
        prop_assert_eq!(utf8, wide);
    }

    #[test]
    fn iteration_terminates_and_moves_forward(text in "\\PC{0,24}") {
        let pattern = Pattern::new("(?:)", Options::NONE).unwrap();
        let found = pattern.find_all(&text).unwrap();
        let count = text.chars().count();
        prop_assert!(found.len() <= count + 1);
        for pair in found.windows(2) {
            prop_assert!(pair[0].start() < pair[1].start());
        }
    }
}
