// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Matching bundle/application identifiers against wildcard patterns.
//!
//! iOS uses dot-delimited identifiers of the form `TEAMID.tld.domain.myapp`,
//! and provisioning profiles describe which identifiers they cover using the
//! same syntax plus an optional trailing wildcard, e.g. `TEAMID.tld.domain.*`.
//! Deciding whether a profile covers a particular bundle, and which of
//! several candidate profiles is the *best* fit, comes down to scoring how
//! many leading dot-separated components an identifier and a pattern share.

use crate::error::AppleCodesignError;

/// Score how well `pattern` matches `identifier`.
///
/// The score is the number of leading dot-delimited components the two have
/// in common. A pattern with a trailing `*` component matches any number of
/// additional trailing components in the identifier; everything before the
/// `*` must match exactly. A score of `0` means no match. A fully exact
/// match scores the number of components in `identifier`.
pub fn score(identifier: &str, pattern: &str) -> Result<u32, AppleCodesignError> {
    if identifier.is_empty() {
        return Err(AppleCodesignError::BadIdentifier(format!(
            "identifier doesn't look right: {:?}",
            identifier
        )));
    }
    if pattern.is_empty() {
        return Err(AppleCodesignError::BadIdentifier(format!(
            "pattern doesn't look right: {:?}",
            pattern
        )));
    }

    let identifier_parts = identifier.split('.').collect::<Vec<_>>();
    let pattern_parts = pattern.split('.').collect::<Vec<_>>();

    if let Some(star_index) = pattern_parts.iter().position(|part| *part == "*") {
        if star_index != pattern_parts.len() - 1 {
            return Err(AppleCodesignError::BadIdentifier(format!(
                "pattern has a non-terminal asterisk: {}",
                pattern
            )));
        }
    }

    let mut score = 0u32;
    let max_len = identifier_parts.len().max(pattern_parts.len());

    for i in 0..max_len {
        let identifier_part = identifier_parts.get(i);
        let pattern_part = pattern_parts.get(i);

        match (identifier_part, pattern_part) {
            (Some(_), Some(&"*")) => break,
            (Some(a), Some(b)) if a == b => score += 1,
            _ => {
                score = 0;
                break;
            }
        }
    }

    Ok(score)
}

/// Find the best-matching pattern for `identifier` among `patterns`.
///
/// Returns the pattern with the highest nonzero [score], or `None` if none
/// of them match. Ties are broken deterministically in favor of the first
/// highest-scoring pattern encountered.
pub fn best_pattern<'a>(
    identifier: &str,
    patterns: impl IntoIterator<Item = &'a str>,
) -> Result<Option<&'a str>, AppleCodesignError> {
    let mut best: Option<(&'a str, u32)> = None;

    for pattern in patterns {
        let this_score = score(identifier, pattern)?;

        if this_score == 0 {
            continue;
        }

        match best {
            Some((_, best_score)) if best_score >= this_score => {}
            _ => best = Some((pattern, this_score)),
        }
    }

    Ok(best.map(|(pattern, _)| pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_scores_full_length() {
        assert_eq!(score("TEAMID.foo.bar", "TEAMID.foo.bar").unwrap(), 3);
    }

    #[test]
    fn wildcard_matches_shared_prefix_only() {
        assert_eq!(score("TEAMID.foo.bar.baz", "TEAMID.foo.*").unwrap(), 2);
        assert_eq!(score("TEAMID.foo", "TEAMID.*").unwrap(), 1);
    }

    #[test]
    fn mismatched_component_scores_zero() {
        assert_eq!(score("TEAMID.foo.bar", "TEAMID.foo.qux").unwrap(), 0);
    }

    #[test]
    fn identifier_shorter_than_non_wildcard_pattern_does_not_match() {
        assert_eq!(score("TEAMID.foo", "TEAMID.foo.bar").unwrap(), 0);
    }

    #[test]
    fn non_terminal_asterisk_is_rejected() {
        assert!(score("TEAMID.foo.bar", "TEAMID.*.bar").is_err());
    }

    #[test]
    fn best_pattern_prefers_most_specific() {
        let patterns = vec!["TEAMID.*", "TEAMID.foo.bar", "TEAMID.foo.*"];
        let best = best_pattern("TEAMID.foo.bar", patterns).unwrap();
        assert_eq!(best, Some("TEAMID.foo.bar"));
    }

    #[test]
    fn best_pattern_none_when_nothing_matches() {
        let patterns = vec!["OTHERTEAM.foo.*"];
        assert_eq!(best_pattern("TEAMID.foo.bar", patterns).unwrap(), None);
    }
}
