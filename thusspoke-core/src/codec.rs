//! Rule codec: rule sets as flat text.
//!
//! Grammar:
//!
//! ```text
//! rules   := record*
//! record  := pairs "|" text "|" pairs "<<<"
//! pairs   := "" | pair ("," pair)*
//! pair    := key "=" value
//! ```
//!
//! Values `true`, `false` and `null` are literals, finite numbers decode as
//! numbers, everything else is text. Line breaks directly before a record are
//! skipped, so a rule set can be written one record per line.
//!
//! ## Limitations
//!
//! There is no escaping. `|` and `<<<` cannot appear anywhere, `,` and `=`
//! cannot appear in keys or values, and a text value spelled like a literal
//! (`"true"`, `"42"`) cannot be represented. Neither can non-finite numbers
//! or keys starting with a line break. [`encode`] refuses such input with
//! [`EngineError::Format`] instead of producing text that would decode
//! differently.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::message::{MessageDraft, NpcMessage};
use crate::types::{Conditions, Scalar, ScalarMap};

/// Terminates every record, including the last.
pub const RECORD_TERMINATOR: &str = "<<<";
/// Separates the three fields of a record.
pub const FIELD_SEPARATOR: char = '|';
/// Separates `key=value` pairs.
pub const PAIR_SEPARATOR: char = ',';
/// Separates a key from its value.
pub const KEY_VALUE_SEPARATOR: char = '=';

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a rule set.
///
/// # Errors
/// Returns [`EngineError::Format`] if any key, value or text contains a
/// reserved sequence or would not decode back to the same value.
pub fn encode(messages: &[NpcMessage]) -> Result<String> {
    let mut out = String::new();
    for (index, message) in messages.iter().enumerate() {
        let conditions = encode_map(index, message.conditions())?;
        let text = message.text();
        if text.contains(FIELD_SEPARATOR) || text.contains(RECORD_TERMINATOR) {
            return Err(EngineError::format(index, "text contains a reserved delimiter"));
        }
        let rewards = encode_map(index, message.rewards())?;

        let record = format!("{conditions}{FIELD_SEPARATOR}{text}{FIELD_SEPARATOR}{rewards}");
        if record.ends_with('<') {
            return Err(EngineError::format(index, "record may not end with '<'"));
        }
        out.push_str(&record);
        out.push_str(RECORD_TERMINATOR);
    }
    Ok(out)
}

/// Encode a single condition or reward map as `key=value,...`.
///
/// # Errors
/// Same rules as [`encode`].
pub fn encode_pairs(map: &ScalarMap) -> Result<String> {
    encode_map(0, map)
}

fn encode_map(record: usize, map: &ScalarMap) -> Result<String> {
    let mut out = String::new();
    for (i, (key, value)) in map.iter().enumerate() {
        if key.is_empty() {
            return Err(EngineError::format(record, "empty key"));
        }
        if key.starts_with(['\r', '\n']) {
            return Err(EngineError::format(record, format!("key {key:?} starts with a line break")));
        }
        check_atom(record, key)?;
        let token = value.to_string();
        check_atom(record, &token)?;
        if Scalar::from_token(&token) != *value {
            return Err(EngineError::format(
                record,
                format!("value {token:?} would not decode as {value:?}"),
            ));
        }
        if i > 0 {
            out.push(PAIR_SEPARATOR);
        }
        out.push_str(key);
        out.push(KEY_VALUE_SEPARATOR);
        out.push_str(&token);
    }
    Ok(out)
}

fn check_atom(record: usize, atom: &str) -> Result<()> {
    let reserved = atom.contains(FIELD_SEPARATOR)
        || atom.contains(PAIR_SEPARATOR)
        || atom.contains(KEY_VALUE_SEPARATOR)
        || atom.contains(RECORD_TERMINATOR);
    if reserved {
        return Err(EngineError::format(
            record,
            format!("{atom:?} contains a reserved delimiter"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a rule set, validating every message.
///
/// # Errors
/// [`EngineError::Format`] for malformed text, [`EngineError::Validation`]
/// for records with empty conditions or text.
pub fn decode(input: &str) -> Result<Vec<NpcMessage>> {
    let input = input.trim_end();
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let Some(body) = input.strip_suffix(RECORD_TERMINATOR) else {
        let record = input.matches(RECORD_TERMINATOR).count();
        return Err(EngineError::format(
            record,
            format!("missing {RECORD_TERMINATOR:?} terminator"),
        ));
    };

    body.split(RECORD_TERMINATOR)
        .enumerate()
        .map(|(index, record)| decode_record(index, record))
        .collect()
}

fn decode_record(index: usize, record: &str) -> Result<NpcMessage> {
    let record = record.trim_start_matches(['\r', '\n']);
    let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
    let [conditions, text, rewards] = fields.as_slice() else {
        return Err(EngineError::format(
            index,
            format!("expected 3 '|'-separated fields, found {}", fields.len()),
        ));
    };
    let conditions = decode_map(index, conditions)?;
    let rewards = decode_map(index, rewards)?;
    NpcMessage::new(conditions, *text, rewards)
}

/// Decode a single `key=value,...` list. An empty string is an empty map.
///
/// # Errors
/// [`EngineError::Format`] for pairs without `=`, empty keys or duplicates.
pub fn decode_pairs(input: &str) -> Result<ScalarMap> {
    decode_map(0, input)
}

fn decode_map(record: usize, input: &str) -> Result<ScalarMap> {
    let mut map = ScalarMap::new();
    if input.is_empty() {
        return Ok(map);
    }
    for pair in input.split(PAIR_SEPARATOR) {
        let Some((key, value)) = pair.split_once(KEY_VALUE_SEPARATOR) else {
            return Err(EngineError::format(record, format!("pair {pair:?} has no '='")));
        };
        if key.is_empty() {
            return Err(EngineError::format(record, "empty key"));
        }
        if map.insert(key, Scalar::from_token(value)).is_some() {
            return Err(EngineError::format(record, format!("duplicate key {key:?}")));
        }
    }
    Ok(map)
}

// ---------------------------------------------------------------------------
// Input representations
// ---------------------------------------------------------------------------

/// A rule set in either of its accepted representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSource {
    /// Codec text.
    Encoded(String),
    /// Structured drafts, validated on resolution.
    Drafts(Vec<MessageDraft>),
}

impl RuleSource {
    /// Parse a JSON document holding either an array of drafts or a string
    /// in codec form.
    ///
    /// # Errors
    /// [`EngineError::Config`] if the JSON has neither shape.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Validate into engine messages, preserving authoring order.
    ///
    /// # Errors
    /// [`EngineError::Format`] or [`EngineError::Validation`].
    pub fn resolve(self) -> Result<Vec<NpcMessage>> {
        match self {
            Self::Encoded(text) => decode(&text),
            Self::Drafts(drafts) => drafts.into_iter().map(NpcMessage::try_from).collect(),
        }
    }
}

impl Default for RuleSource {
    fn default() -> Self {
        Self::Drafts(Vec::new())
    }
}

impl From<&str> for RuleSource {
    fn from(value: &str) -> Self {
        Self::Encoded(value.to_string())
    }
}

impl From<String> for RuleSource {
    fn from(value: String) -> Self {
        Self::Encoded(value)
    }
}

impl From<Vec<MessageDraft>> for RuleSource {
    fn from(value: Vec<MessageDraft>) -> Self {
        Self::Drafts(value)
    }
}

impl From<Vec<NpcMessage>> for RuleSource {
    fn from(value: Vec<NpcMessage>) -> Self {
        Self::Drafts(value.into_iter().map(MessageDraft::from).collect())
    }
}

/// A condition map in either of its accepted representations.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionSource {
    /// `key=value,...` text.
    Encoded(String),
    /// Structured map.
    Map(Conditions),
}

impl ConditionSource {
    /// Resolve into a structured map.
    ///
    /// # Errors
    /// [`EngineError::Format`] for malformed pair lists.
    pub fn resolve(self) -> Result<Conditions> {
        match self {
            Self::Encoded(text) => decode_pairs(&text),
            Self::Map(map) => Ok(map),
        }
    }
}

impl From<&str> for ConditionSource {
    fn from(value: &str) -> Self {
        Self::Encoded(value.to_string())
    }
}

impl From<String> for ConditionSource {
    fn from(value: String) -> Self {
        Self::Encoded(value)
    }
}

impl From<Conditions> for ConditionSource {
    fn from(value: Conditions) -> Self {
        Self::Map(value)
    }
}

impl From<&Conditions> for ConditionSource {
    fn from(value: &Conditions) -> Self {
        Self::Map(value.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
