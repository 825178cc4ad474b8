//! Version ordering for Minecraft-style identifiers
//!
//! Identifiers like `1.21.1`, `1.20-pre1` or `3.4.0-SNAPSHOT` are not semver,
//! so ordering is done on a small parsed form:
//!
//! - the main segment (before the first `-`) is a list of dot-separated numbers
//! - the optional pre-release segment has a kind (`snapshot < alpha < beta <
//!   pre < rc`) and a trailing number
//!
//! A release outranks any pre-release of the same main version. Identifiers
//! whose main segment does not start with a digit are unparseable and sort
//! below every parseable one.

use std::cmp::Ordering;

/// Pre-release kinds from lowest to highest; unknown kinds rank below all of them
const PRE_RELEASE_ORDER: &[&str] = &["snapshot", "alpha", "beta", "pre", "rc"];

#[derive(Debug, Clone, PartialEq, Eq)]
struct PreRelease {
    rank: usize,
    number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedVersion {
    main: Vec<u64>,
    pre: Option<PreRelease>,
}

fn parse(version: &str) -> Option<ParsedVersion> {
    let lower = version.trim().to_ascii_lowercase();
    let (main, pre) = match lower.split_once('-') {
        Some((main, pre)) => (main, Some(pre)),
        None => (lower.as_str(), None),
    };

    if !main.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let main = main
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        })
        .collect();

    Some(ParsedVersion {
        main,
        pre: pre.map(parse_pre_release),
    })
}

fn parse_pre_release(tag: &str) -> PreRelease {
    let split = tag
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(tag.len());
    let (kind, number) = tag.split_at(split);
    let kind = kind.trim_end_matches(['.', '-', '_']);

    // `+ 1` leaves rank 0 for kinds outside the table
    let rank = PRE_RELEASE_ORDER
        .iter()
        .position(|k| *k == kind)
        .map_or(0, |i| i + 1);
    let digits: String = number.chars().take_while(|c| c.is_ascii_digit()).collect();

    PreRelease {
        rank,
        number: digits.parse().unwrap_or(0),
    }
}

fn compare_main(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Compare two version identifiers.
///
/// `Ordering::Greater` means `a` is newer than `b`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (None, None) => a.cmp(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_main(&a.main, &b.main).then_with(|| match (a.pre, b.pre) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => x.rank.cmp(&y.rank).then(x.number.cmp(&y.number)),
        }),
    }
}

/// Sort identifiers newest first
pub fn sort_newest_first<T>(items: &mut [T], id: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| compare_versions(id(b), id(a)));
}
