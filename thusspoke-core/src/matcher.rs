//! Rule matching: choosing what an NPC says in answer to a query.
//!
//! Policy:
//!
//! 1. If the NPC has a range limit and the query's numeric `range` exceeds
//!    it, nothing is said.
//! 2. Messages are scanned in authoring order. A message matches when every
//!    key of its own conditions is present in the query with an equal value;
//!    extra query keys are ignored. The first match wins.
//! 3. Failing that, the first message carrying a `greeting` key is returned,
//!    whether or not the rest of its conditions matched.
//!
//! Authors therefore order specific rules before general ones.

use crate::message::{BANTER_KEY, NpcMessage};
use crate::types::Conditions;

/// Query key compared against the NPC's range limit.
pub const RANGE_KEY: &str = "range";

/// Why a query produced (or did not produce) a message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome<'a> {
    /// A message whose conditions all matched.
    Matched(&'a NpcMessage),
    /// No full match; the greeting fallback was chosen.
    Greeting(&'a NpcMessage),
    /// The query's range exceeded the NPC's limit.
    OutOfRange,
    /// Nothing matched and no greeting exists.
    NoMatch,
}

impl<'a> MatchOutcome<'a> {
    /// The selected message, if any.
    #[must_use]
    pub fn message(self) -> Option<&'a NpcMessage> {
        match self {
            Self::Matched(m) | Self::Greeting(m) => Some(m),
            Self::OutOfRange | Self::NoMatch => None,
        }
    }
}

/// Evaluate `query` against `messages` for an NPC with the given `range`
/// limit (`0.0` means unlimited).
#[must_use]
pub fn evaluate<'a>(query: &Conditions, messages: &'a [NpcMessage], range: f64) -> MatchOutcome<'a> {
    if out_of_range(query, range) {
        return MatchOutcome::OutOfRange;
    }

    let mut greeting = None;
    for message in messages {
        if message.conditions().is_subset_of(query) {
            return MatchOutcome::Matched(message);
        }
        if greeting.is_none() && message.is_greeting() {
            greeting = Some(message);
        }
    }

    greeting.map_or(MatchOutcome::NoMatch, MatchOutcome::Greeting)
}

/// The message an NPC would speak in answer to `query`, if any.
#[must_use]
pub fn find_match<'a>(query: &Conditions, messages: &'a [NpcMessage], range: f64) -> Option<&'a NpcMessage> {
    evaluate(query, messages, range).message()
}

/// Every message carrying a `banter` condition key, in authoring order.
#[must_use]
pub fn banter_candidates(messages: &[NpcMessage]) -> Vec<&NpcMessage> {
    messages
        .iter()
        .filter(|m| m.conditions().contains_key(BANTER_KEY))
        .collect()
}

fn out_of_range(query: &Conditions, range: f64) -> bool {
    if range == 0.0 {
        return false;
    }
    query
        .get(RANGE_KEY)
        .and_then(crate::types::Scalar::as_number)
        .is_some_and(|distance| distance > range)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Scalar, ScalarMap};

    fn msg(conditions: ScalarMap, text: &str) -> NpcMessage {
        NpcMessage::new(conditions, text, ScalarMap::new()).expect("valid message")
    }

    fn shopkeeper() -> Vec<NpcMessage> {
        vec![
            msg(ScalarMap::new().with("greeting", true), "Hello!"),
            msg(ScalarMap::new().with("item", "ring").with("quest", 2), "That ring again?"),
            msg(ScalarMap::new().with("item", "ring"), "You found my ring!"),
            msg(ScalarMap::new().with("item", "ring"), "Never reached."),
            msg(ScalarMap::new().with("banter", true), "Fine wares!"),
        ]
    }

    #[test]
    fn extra_query_keys_are_ignored() {
        let rules = vec![msg(ScalarMap::new().with("a", 1), "one")];
        let query = ScalarMap::new().with("a", 1).with("b", 2);
        assert_eq!(find_match(&query, &rules, 0.0).map(NpcMessage::text), Some("one"));
    }

    #[test]
    fn missing_required_key_fails() {
        let rules = vec![msg(ScalarMap::new().with("a", 1).with("b", 2), "both")];
        let query = ScalarMap::new().with("a", 1);
        assert_eq!(find_match(&query, &rules, 0.0), None);
    }

    #[test]
    fn first_match_wins() {
        let rules = shopkeeper();
        let query = ScalarMap::new().with("item", "ring");
        let outcome = evaluate(&query, &rules, 0.0);
        assert!(matches!(outcome, MatchOutcome::Matched(m) if m.text() == "You found my ring!"));

        let specific = ScalarMap::new().with("item", "ring").with("quest", 2);
        assert_eq!(
            find_match(&specific, &rules, 0.0).map(NpcMessage::text),
            Some("That ring again?")
        );
    }

    #[test]
    fn greeting_fallback_when_nothing_matches() {
        let rules = shopkeeper();
        let outcome = evaluate(&ScalarMap::new(), &rules, 0.0);
        assert!(matches!(outcome, MatchOutcome::Greeting(m) if m.text() == "Hello!"));
    }

    #[test]
    fn greeting_can_still_match_fully() {
        let rules = shopkeeper();
        let query = ScalarMap::new().with("greeting", true);
        assert!(matches!(evaluate(&query, &rules, 0.0), MatchOutcome::Matched(m) if m.text() == "Hello!"));
    }

    #[test]
    fn first_greeting_is_remembered() {
        let rules = vec![
            msg(ScalarMap::new().with("greeting", "morning").with("hour", 8), "Good morning."),
            msg(ScalarMap::new().with("greeting", "evening"), "Good evening."),
        ];
        let query = ScalarMap::new().with("hour", 20);
        assert_eq!(find_match(&query, &rules, 0.0).map(NpcMessage::text), Some("Good morning."));
    }

    #[test]
    fn no_match_without_greeting() {
        let rules = vec![msg(ScalarMap::new().with("item", "ring"), "ring")];
        assert_eq!(evaluate(&ScalarMap::new(), &rules, 0.0), MatchOutcome::NoMatch);
    }

    #[test]
    fn strict_value_equality() {
        let rules = vec![msg(ScalarMap::new().with("level", 1), "one")];
        let query = ScalarMap::new().with("level", "1");
        assert_eq!(find_match(&query, &rules, 0.0), None);
    }

    #[test]
    fn range_limit_rejects_before_matching() {
        let rules = shopkeeper();
        let far = ScalarMap::new().with("item", "ring").with("range", 6);
        assert_eq!(evaluate(&far, &rules, 5.0), MatchOutcome::OutOfRange);

        let near = ScalarMap::new().with("item", "ring").with("range", 5);
        assert!(find_match(&near, &rules, 5.0).is_some());

        assert!(find_match(&far, &rules, 0.0).is_some(), "0 means unlimited");
    }

    #[test]
    fn non_numeric_range_is_not_compared() {
        let rules = shopkeeper();
        let query = ScalarMap::new().with("range", Scalar::from("far"));
        assert!(matches!(evaluate(&query, &rules, 5.0), MatchOutcome::Greeting(_)));
    }

    #[test]
    fn banter_candidates_by_key_presence() {
        let mut rules = shopkeeper();
        rules.push(msg(ScalarMap::new().with("banter", false), "Still banter."));
        let candidates: Vec<&str> = banter_candidates(&rules).into_iter().map(NpcMessage::text).collect();
        assert_eq!(candidates, vec!["Fine wares!", "Still banter."]);
    }
}
