//! Integration tests for the bridge
//!
//! These tests run the whole pipeline (wrap, negotiate, encode, search,
//! translate) against the bundled regex backend.

use rebridge_core::{
    CompactStrategy, Encoding, Options, Pattern, PatternBuilder, Region, RegexError, WrappedText,
};

fn char_regions(pattern: &Pattern, text: &str) -> Vec<Region> {
    pattern
        .find_all(text)
        .unwrap()
        .iter()
        .map(|m| m.region())
        .collect()
}

mod scenarios {
    use super::*;

    #[test]
    fn test_search_reports_char_region() {
        let pattern = Pattern::new("a+", Options::NONE).unwrap();
        let found = pattern.search("baaab").unwrap().unwrap();
        assert_eq!(found.group(0).unwrap(), "aaa");
        assert_eq!(found.start(), 1);
        assert_eq!(found.end(), 4);
        assert_eq!(found.region(), Region::new(1, 4));
    }

    #[test]
    fn test_named_group_lookup() {
        let pattern = Pattern::new("(?<num>[0-9]+)", Options::NONE).unwrap();
        let found = pattern.search("x42y").unwrap().unwrap();
        assert_eq!(found.named_group("num").unwrap(), vec!["42"]);
        assert_eq!(pattern.group_numbers_by_name("num").unwrap(), vec![1]);
    }

    #[test]
    fn test_find_all_single_chars() {
        let pattern = Pattern::new("a", Options::NONE).unwrap();
        assert_eq!(
            char_regions(&pattern, "aaa"),
            vec![Region::new(0, 1), Region::new(1, 2), Region::new(2, 3)]
        );
    }

    #[test]
    fn test_utf16_subject_compiles_second_handle() {
        let pattern = Pattern::new("b+", Options::NONE).unwrap();
        assert!(pattern.is_compiled(Encoding::Utf8));

        let bytes = Encoding::Utf16Le.encode_bytes("\u{1F600}abbc").unwrap();
        let subject = WrappedText::from_encoded(bytes, Encoding::Utf16Le).unwrap();
        let found = pattern.search_wrapped(&subject, 0).unwrap().unwrap();

        assert_eq!(found.encoding(), Encoding::Utf16Le);
        assert_eq!(found.byte_region(), Region::new(6, 10));
        assert_eq!(found.region(), Region::new(2, 4));
        assert_eq!(found.group(0).unwrap(), "bb");
        assert!(pattern.is_compiled(Encoding::Utf16Le));
        assert!(pattern.is_compiled(Encoding::Utf8));
    }

    #[test]
    fn test_unknown_encoding_name() {
        assert_eq!(
            Encoding::get_by_name("bogus"),
            Err(RegexError::UnknownEncoding("bogus".to_string()))
        );
    }
}

mod boundaries {
    use super::*;

    #[test]
    fn test_empty_subject_without_empty_match() {
        let pattern = Pattern::new("a", Options::NONE).unwrap();
        assert!(pattern.search("").unwrap().is_none());
        assert!(pattern.find_all("").unwrap().is_empty());
    }

    #[test]
    fn test_empty_subject_with_empty_match() {
        let pattern = Pattern::new("x*", Options::NONE).unwrap();
        let found = pattern.search("").unwrap().unwrap();
        assert_eq!(found.region(), Region::new(0, 0));
        assert_eq!(char_regions(&pattern, ""), vec![Region::new(0, 0)]);
    }

    #[test]
    fn test_zero_width_advances_one_char() {
        let pattern = Pattern::new("a*", Options::NONE).unwrap();
        assert_eq!(char_regions(&pattern, "b"), vec![Region::new(0, 0)]);
        assert_eq!(
            char_regions(&pattern, "baa"),
            vec![Region::new(0, 0), Region::new(1, 3)]
        );
    }

    #[test]
    fn test_zero_width_over_multibyte_chars() {
        let pattern = Pattern::new("x*", Options::NONE).unwrap();
        for encoding in [Encoding::Utf8, Encoding::Utf16Be, Encoding::Utf32Le] {
            let subject =
                WrappedText::with_native_encoding("\u{e9}\u{1F600}", encoding).unwrap();
            let regions: Vec<Region> = pattern
                .find_iter_wrapped(&subject, 0)
                .unwrap()
                .map(|m| m.unwrap().region())
                .collect();
            assert_eq!(
                regions,
                vec![Region::new(0, 0), Region::new(1, 1)],
                "{encoding}"
            );
        }
    }

    #[test]
    fn test_start_at_end() {
        let pattern = Pattern::new("a", Options::NONE).unwrap();
        assert!(pattern.find_all_at("aaa", 3).unwrap().is_empty());
        assert!(pattern.find_all_at("aaa", 10).unwrap().is_empty());
        assert_eq!(pattern.find_all_at("aaa", 1).unwrap().len(), 2);
    }

    #[test]
    fn test_find_all_matches_drained_iterator() {
        let pattern = Pattern::new("[0-9]+|\u{4e16}", Options::NONE).unwrap();
        let text = "12 \u{4e16} 345 x 6";
        let collected: Vec<Region> = pattern
            .find_iter(text)
            .unwrap()
            .map(|m| m.unwrap().region())
            .collect();
        assert_eq!(collected, char_regions(&pattern, text));
        assert_eq!(collected.len(), 4);
    }
}

mod encodings {
    use super::*;

    #[test]
    fn test_same_results_in_every_wide_encoding() {
        let pattern = Pattern::new("(\\w)(\u{1F600})?", Options::NONE).unwrap();
        let text = "a\u{1F600} b c\u{1F600}";
        let expected = char_regions(&pattern, text);
        assert_eq!(expected.len(), 3);

        for encoding in [
            Encoding::Utf16Le,
            Encoding::Utf16Be,
            Encoding::Utf32Le,
            Encoding::Utf32Be,
        ] {
            let subject = WrappedText::with_native_encoding(text, encoding).unwrap();
            let found: Vec<Region> = pattern
                .find_iter_wrapped(&subject, 0)
                .unwrap()
                .map(|m| m.unwrap().region())
                .collect();
            assert_eq!(found, expected, "{encoding}");
        }
    }

    #[test]
    fn test_latin1_subject_negotiates_up() {
        let pattern = Pattern::new("caf\u{e9}", Options::NONE).unwrap();
        let subject = WrappedText::with_native_encoding("un caf\u{e9}", Encoding::Iso8859_1).unwrap();
        assert_eq!(pattern.negotiate_encoding(&subject), Encoding::Utf8);
        let found = pattern.search_wrapped(&subject, 0).unwrap().unwrap();
        assert_eq!(found.region(), Region::new(3, 7));
    }

    #[test]
    fn test_compact_strategy_end_to_end() {
        let pattern = PatternBuilder::new("\u{e9}+")
            .strategy(CompactStrategy)
            .build()
            .unwrap();
        assert_eq!(pattern.native_encoding(), Encoding::Iso8859_1);

        let found = pattern.search("caf\u{e9}\u{e9}").unwrap().unwrap();
        assert_eq!(found.encoding(), Encoding::Iso8859_1);
        assert_eq!(found.region(), Region::new(3, 5));

        // a wider subject forces a wider handle
        let found = pattern.search("\u{4e16}\u{e9}").unwrap().unwrap();
        assert_eq!(found.encoding().rank(), Encoding::Utf16Le.rank());
        assert_eq!(found.region(), Region::new(1, 2));
    }

    #[test]
    fn test_groups_in_utf32() {
        let pattern = Pattern::new("(a)|(\u{4e16})", Options::NONE).unwrap();
        let subject = WrappedText::with_native_encoding("x\u{4e16}", Encoding::Utf32Le).unwrap();
        let found = pattern.search_wrapped(&subject, 0).unwrap().unwrap();
        assert_eq!(found.groups(), vec![Some("\u{4e16}"), None, Some("\u{4e16}")]);
        assert_eq!(
            found.regions(),
            &[Some(Region::new(1, 2)), None, Some(Region::new(1, 2))]
        );
        assert_eq!(found.group(1), Err(RegexError::InvalidGroupIndex(1)));
    }
}

mod options {
    use super::*;

    #[test]
    fn test_ignorecase() {
        let pattern = Pattern::new("hello", Options::IGNORECASE).unwrap();
        assert_eq!(pattern.find_all("Hello HELLO").unwrap().len(), 2);
    }

    #[test]
    fn test_line_anchors_by_default() {
        let pattern = Pattern::new("^\\w+$", Options::NONE).unwrap();
        assert_eq!(pattern.find_all("one\ntwo").unwrap().len(), 2);

        let pattern = Pattern::new("^\\w+$", Options::SINGLELINE).unwrap();
        assert!(pattern.find_all("one\ntwo").unwrap().is_empty());
    }

    #[test]
    fn test_find_not_empty() {
        let pattern = Pattern::new("a*", Options::FIND_NOT_EMPTY).unwrap();
        assert_eq!(
            char_regions(&pattern, "baab"),
            vec![Region::new(1, 3)]
        );
    }

    #[test]
    fn test_find_not_empty_takes_non_empty_alternative() {
        for source in ["a??", "|a"] {
            let pattern = Pattern::new(source, Options::FIND_NOT_EMPTY).unwrap();
            let found = pattern.search("a").unwrap().unwrap();
            assert_eq!(found.region(), Region::new(0, 1), "{source}");
            assert_eq!(char_regions(&pattern, "xaa"), vec![Region::new(1, 2), Region::new(2, 3)]);
        }

        let wide = WrappedText::with_native_encoding("\u{1F600}a", Encoding::Utf32Be).unwrap();
        let pattern = Pattern::new("|a", Options::FIND_NOT_EMPTY).unwrap();
        let found = pattern.search_wrapped(&wide, 0).unwrap().unwrap();
        assert_eq!(found.region(), Region::new(1, 2));
    }

    #[test]
    fn test_none_option_by_name() {
        assert_eq!("none".parse::<Options>().unwrap(), Options::NONE);
        assert_eq!(
            "none|find_not_empty".parse::<Options>().unwrap(),
            Options::FIND_NOT_EMPTY
        );
    }

    #[test]
    fn test_find_longest_rejected_at_construction() {
        assert!(matches!(
            Pattern::new("a|ab", Options::FIND_LONGEST),
            Err(RegexError::PatternCompile { .. })
        ));
    }
}
