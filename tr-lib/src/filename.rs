use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Grammar, TakeIdentity, UNRESOLVED};

/// Current naming convention, e.g. `en_ulb_b41_mrk_c01_v01-05_t02.wav`.
/// The project section is either `<source>_b<num>_<book>` or the literal
/// `obs` for Open Bible Stories takes.
static CURRENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([a-zA-Z]{2,3}[-\w]*)_(([a-zA-Z]{3})_b(\d{2})_([1-3]*[a-zA-Z]+)|obs)_c(\d{2,3})_v(\d{2,3})(-(\d{2,3}))?(_t(\d{2}))?",
    )
    .expect("current filename pattern")
});

/// Legacy naming convention used before recorder 8.5, e.g.
/// `en_ulb_mrk_01-01_02.wav`. Chapter and verse are joined by a dash with
/// no `c`/`v` markers, there is no book number and never an end verse.
static LEGACY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([a-zA-Z]{2,3}[-\w]*)_([a-zA-Z]{3})_([1-3]*[a-zA-Z]+)_(\d{2,3})-(\d{2,3})_?(\d{2,3})?")
        .expect("legacy filename pattern")
});

/// Encode a verse/chapter/book number the way take metadata stores it.
pub fn unit_to_string(unit: i32) -> String {
    format!("{unit:02}")
}

fn group_int(caps: &regex::Captures<'_>, idx: usize) -> i32 {
    caps.get(idx)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(UNRESOLVED)
}

fn group_str(caps: &regex::Captures<'_>, idx: usize) -> String {
    caps.get(idx).map(|m| m.as_str().to_string()).unwrap_or_default()
}

/// Extract take identity from a filename.
///
/// Tries the current grammar first, then the legacy one. Neither matching
/// is not an error: the returned identity has `matched == false` and
/// callers are expected to skip the file.
///
/// A take marker absent from a current-grammar name means take 0, while a
/// legacy name without one means take 1. The asymmetry is load-bearing:
/// filenames produced by the two recorder generations are compared against
/// these defaults elsewhere, so neither may be "fixed" to match the other.
pub fn parse(filename: &str) -> TakeIdentity {
    if let Some(caps) = CURRENT.captures(filename) {
        let take = match caps.get(11) {
            Some(m) => m.as_str().parse().unwrap_or(UNRESOLVED),
            None => 0,
        };
        return TakeIdentity {
            language: group_str(&caps, 1),
            source: group_str(&caps, 3),
            book: group_str(&caps, 5),
            book_number: group_int(&caps, 4),
            chapter: group_int(&caps, 6),
            start_verse: group_int(&caps, 7),
            end_verse: group_int(&caps, 9),
            take,
            grammar: Grammar::Current,
            matched: true,
        };
    }

    if let Some(caps) = LEGACY.captures(filename) {
        let take = match caps.get(6) {
            Some(m) => m.as_str().parse().unwrap_or(UNRESOLVED),
            None => 1,
        };
        return TakeIdentity {
            language: group_str(&caps, 1),
            source: group_str(&caps, 2),
            book: group_str(&caps, 3),
            book_number: UNRESOLVED,
            chapter: group_int(&caps, 4),
            start_verse: group_int(&caps, 5),
            end_verse: UNRESOLVED,
            take,
            grammar: Grammar::Legacy,
            matched: true,
        };
    }

    TakeIdentity::default()
}

/// The canonical name of a take minus its take marker and extension.
///
/// Psalms chapters are three digits wide, and chapter 119 additionally
/// widens its verse numbers to three digits. `obs` takes carry no source
/// or book number.
pub fn name_without_take(id: &TakeIdentity) -> String {
    if id.book.is_empty() {
        return format!("{}_obs_c{:02}_v{:02}", id.language, id.chapter, id.start_verse);
    }

    if id.book == "psa" && id.chapter == 119 {
        let end = if id.end_verse != UNRESOLVED {
            format!("-{:03}", id.end_verse)
        } else {
            String::new()
        };
        format!(
            "{}_{}_b{:02}_{}_c{:03}_v{:03}{}",
            id.language, id.source, id.book_number, id.book, id.chapter, id.start_verse, end
        )
    } else if id.book == "psa" {
        let end = if id.end_verse != UNRESOLVED && id.start_verse != id.end_verse {
            format!("-{:02}", id.end_verse)
        } else {
            String::new()
        };
        format!(
            "{}_{}_b{:02}_{}_c{:03}_v{:02}{}",
            id.language, id.source, id.book_number, id.book, id.chapter, id.start_verse, end
        )
    } else {
        let end = if id.end_verse != UNRESOLVED && id.start_verse != id.end_verse {
            format!("-{:02}", id.end_verse)
        } else {
            String::new()
        };
        format!(
            "{}_{}_b{:02}_{}_c{:02}_v{:02}{}",
            id.language, id.source, id.book_number, id.book, id.chapter, id.start_verse, end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_grammar_full() {
        let id = parse("en_ulb_b41_mrk_c01_v01-05_t02.wav");
        assert!(id.matched);
        assert_eq!(id.grammar, Grammar::Current);
        assert_eq!(id.language, "en");
        assert_eq!(id.source, "ulb");
        assert_eq!(id.book, "mrk");
        assert_eq!(id.book_number, 41);
        assert_eq!(id.chapter, 1);
        assert_eq!(id.start_verse, 1);
        assert_eq!(id.end_verse, 5);
        assert_eq!(id.take, 2);
    }

    #[test]
    fn test_current_grammar_single_verse_no_take() {
        // A current-grammar name without a take marker means take 0.
        let id = parse("xx_zz_b41_mrk_c02_v99.wav");
        assert!(id.matched);
        assert_eq!(id.grammar, Grammar::Current);
        assert_eq!(id.start_verse, 99);
        assert_eq!(id.end_verse, UNRESOLVED);
        assert_eq!(id.take, 0);
    }

    #[test]
    fn test_current_grammar_numbered_book_slug() {
        let id = parse("pt-br_udb_b62_1jn_c05_v01-03_t01.wav");
        assert!(id.matched);
        assert_eq!(id.language, "pt-br");
        assert_eq!(id.book, "1jn");
        assert_eq!(id.book_number, 62);
    }

    #[test]
    fn test_current_grammar_obs() {
        let id = parse("en_obs_c01_v01_t03.wav");
        assert!(id.matched);
        assert_eq!(id.grammar, Grammar::Current);
        assert_eq!(id.language, "en");
        assert_eq!(id.source, "");
        assert_eq!(id.book, "");
        assert_eq!(id.book_number, UNRESOLVED);
        assert_eq!(id.take, 3);
    }

    #[test]
    fn test_legacy_grammar_no_take() {
        // Legacy names without a take marker mean take 1, not 0.
        let id = parse("en_ulb_mrk_01-01.wav");
        assert!(id.matched);
        assert_eq!(id.grammar, Grammar::Legacy);
        assert_eq!(id.language, "en");
        assert_eq!(id.source, "ulb");
        assert_eq!(id.book, "mrk");
        assert_eq!(id.book_number, UNRESOLVED);
        assert_eq!(id.chapter, 1);
        assert_eq!(id.start_verse, 1);
        assert_eq!(id.end_verse, UNRESOLVED);
        assert_eq!(id.take, 1);
    }

    #[test]
    fn test_legacy_grammar_with_take() {
        let id = parse("ru_reg_jud_01-06_03.wav");
        assert!(id.matched);
        assert_eq!(id.grammar, Grammar::Legacy);
        assert_eq!(id.chapter, 1);
        assert_eq!(id.start_verse, 6);
        assert_eq!(id.take, 3);
    }

    #[test]
    fn test_current_name_is_not_parsed_as_legacy() {
        // The current grammar wins for names carrying c/v markers; the
        // legacy pattern must not fire on them at all.
        assert!(!LEGACY.is_match("en_ulb_b41_mrk_c01_v01-05_t02.wav"));
        let id = parse("en_ulb_b41_mrk_c01_v01-05_t02.wav");
        assert_eq!(id.grammar, Grammar::Current);
    }

    #[test]
    fn test_legacy_name_is_not_parsed_as_current() {
        assert!(!CURRENT.is_match("en_ulb_mrk_01-01.wav"));
        let id = parse("en_ulb_mrk_01-01.wav");
        assert_eq!(id.grammar, Grammar::Legacy);
    }

    #[test]
    fn test_unmatched_returns_default() {
        for name in ["chapter.wav", "notes.txt", "en_ulb.wav", "recording"] {
            let id = parse(name);
            assert!(!id.matched, "{name} should not match");
            assert_eq!(id.take, UNRESOLVED);
        }
    }

    #[test]
    fn test_name_without_take_standard_book() {
        let id = parse("en_ulb_b41_mrk_c01_v01-05_t02.wav");
        assert_eq!(name_without_take(&id), "en_ulb_b41_mrk_c01_v01-05");
    }

    #[test]
    fn test_name_without_take_collapses_same_verse_range() {
        let id = parse("en_ulb_b41_mrk_c01_v03-03_t02.wav");
        assert_eq!(name_without_take(&id), "en_ulb_b41_mrk_c01_v03");
    }

    #[test]
    fn test_name_without_take_psalms_padding() {
        let id = parse("en_ulb_b19_psa_c003_v02_t01.wav");
        assert_eq!(name_without_take(&id), "en_ulb_b19_psa_c003_v02");

        let long = parse("en_ulb_b19_psa_c119_v001-008_t01.wav");
        assert_eq!(name_without_take(&long), "en_ulb_b19_psa_c119_v001-008");
    }

    #[test]
    fn test_name_without_take_obs() {
        let id = parse("en_obs_c01_v02_t01.wav");
        assert_eq!(name_without_take(&id), "en_obs_c01_v02");
    }

    #[test]
    fn test_unit_to_string_pads_to_two_digits() {
        assert_eq!(unit_to_string(4), "04");
        assert_eq!(unit_to_string(41), "41");
        assert_eq!(unit_to_string(119), "119");
    }
}
