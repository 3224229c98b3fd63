//! Configuration loading and validation.
//!
//! The config file is JSON with a few conveniences: field names are accepted
//! in snake_case, camelCase, or PascalCase, and `//` / `/* */` comments and
//! trailing commas are tolerated.
//!
//! ```json
//! {
//!   // How many times to repeat the sequence; 0 = forever
//!   "loopCount": 3,
//!   "initialDelayMs": 3000,
//!   "actions": [
//!     { "key": "Ctrl+S", "holdMs": 0, "waitAfterMs": 500 },
//!     { "key": " ", "holdMs": 250, "waitAfterMs": 1000 },
//!   ]
//! }
//! ```

use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::{KprError, Result};

/// A single key-press action followed by an optional pause.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyAction {
    /// The key to press. Supports single characters (`"A"`, `"1"`, `" "`),
    /// named keys (`"Enter"`, `"F5"`, `"Left"`), and modifier combos
    /// (`"Ctrl+C"`, `"Alt+F4"`, `"Ctrl+Shift+S"`).
    #[serde(alias = "Key")]
    pub key: String,

    /// Milliseconds to hold the key down before releasing. 0 means tap:
    /// press and immediately release.
    #[serde(default, alias = "holdMs", alias = "HoldMs", alias = "holdms")]
    pub hold_ms: u64,

    /// Milliseconds to wait after this action before the next one.
    #[serde(
        default = "default_wait_after_ms",
        alias = "waitAfterMs",
        alias = "WaitAfterMs",
        alias = "waitafterms"
    )]
    pub wait_after_ms: u64,
}

fn default_wait_after_ms() -> u64 {
    500
}

/// Root configuration for a replay run. Loaded once before the engine
/// starts; read-only during replay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReplayConfig {
    /// How many times to repeat the full sequence. 0 or negative means
    /// loop forever.
    #[serde(alias = "loopCount", alias = "LoopCount", alias = "loopcount")]
    pub loop_count: i32,

    /// Milliseconds before the first key press, giving the operator time to
    /// focus the target window.
    #[serde(alias = "initialDelayMs", alias = "InitialDelayMs", alias = "initialdelayms")]
    pub initial_delay_ms: u64,

    /// Ordered list of key actions to replay.
    #[serde(alias = "Actions")]
    pub actions: Vec<KeyAction>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            loop_count: 0,
            initial_delay_ms: 3000,
            actions: Vec::new(),
        }
    }
}

impl ReplayConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| KprError::config_load(path, e.to_string()))?;
        Self::from_json(&raw).map_err(|e| match e {
            KprError::Json(e) => KprError::config_load(path, e.to_string()),
            other => other,
        })
    }

    /// Parse configuration from a JSON document, accepting comments,
    /// trailing commas, and field names in any casing.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(&strip_jsonc(raw))?;
        let config: Self = serde_json::from_value(lowercase_keys(value))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file (pretty-printed).
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| KprError::config_save(path, e.to_string()))?;
        fs::write(path, json).map_err(|e| KprError::config_save(path, e.to_string()))?;
        Ok(())
    }

    /// Validate the configuration.
    ///
    /// Key expressions are resolved lazily at replay time; validation only
    /// rejects what can never work, like a blank key.
    pub fn validate(&self) -> Result<()> {
        for (i, action) in self.actions.iter().enumerate() {
            if action.key.is_empty() {
                return Err(KprError::config_validation(format!(
                    "action {} has an empty key",
                    i + 1
                )));
            }
        }
        Ok(())
    }
}

/// Lowercases every object key so field matching ignores the casing the
/// config author used. Snake_case and lowercased camelCase spellings are
/// both covered by serde aliases on the structs.
fn lowercase_keys(value: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), lowercase_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

/// Strips `//` and `/* */` comments plus trailing commas so the file can be
/// handed to a strict JSON parser. String literals (including escapes) are
/// left untouched. Comments are removed first so a comma separated from its
/// closing brace by a comment still counts as trailing.
fn strip_jsonc(input: &str) -> String {
    let without_comments = strip_comments(input.as_bytes());
    let out = strip_trailing_commas(&without_comments);
    // Only ASCII bytes were inspected or removed, so the output is still
    // valid UTF-8.
    String::from_utf8(out).unwrap_or_default()
}

fn strip_comments(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i = copy_string_literal(bytes, i, &mut out);
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    out
}

fn strip_trailing_commas(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i = copy_string_literal(bytes, i, &mut out);
            }
            b',' => {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                // Drop the comma when the next significant byte closes the
                // container
                if !(j < bytes.len() && (bytes[j] == b'}' || bytes[j] == b']')) {
                    out.push(b',');
                }
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    out
}

/// Copies the string literal starting at `bytes[start]` (a `"`) into `out`,
/// honoring escapes. Returns the index just past the closing quote.
fn copy_string_literal(bytes: &[u8], start: usize, out: &mut Vec<u8>) -> usize {
    let mut i = start;
    out.push(b'"');
    i += 1;
    while i < bytes.len() {
        let b = bytes[i];
        out.push(b);
        i += 1;
        if b == b'\\' && i < bytes.len() {
            out.push(bytes[i]);
            i += 1;
        } else if b == b'"' {
            break;
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_comments() {
        let json = "{\n  // a comment\n  \"loop_count\": 2\n}";
        let config: ReplayConfig = serde_json::from_str(&strip_jsonc(json)).unwrap();
        assert_eq!(config.loop_count, 2);
    }

    #[test]
    fn test_strip_block_comments_and_trailing_commas() {
        let json = r#"{
            "initial_delay_ms": 100, /* short for tests */
            "actions": [
                { "key": "A", },
            ],
        }"#;
        let config: ReplayConfig = serde_json::from_str(&strip_jsonc(json)).unwrap();
        assert_eq!(config.initial_delay_ms, 100);
        assert_eq!(config.actions.len(), 1);
    }

    #[test]
    fn test_strip_trailing_comma_before_comment() {
        let json = r#"{ "loop_count": 4, /* end */ }"#;
        let config: ReplayConfig = serde_json::from_str(&strip_jsonc(json)).unwrap();
        assert_eq!(config.loop_count, 4);
    }

    #[test]
    fn test_strip_preserves_strings() {
        let json = r#"{ "actions": [{ "key": "/" }, { "key": "," }] }"#;
        let config: ReplayConfig = serde_json::from_str(&strip_jsonc(json)).unwrap();
        assert_eq!(config.actions[0].key, "/");
        assert_eq!(config.actions[1].key, ",");
    }

    #[test]
    fn test_defaults() {
        let config: ReplayConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.loop_count, 0);
        assert_eq!(config.initial_delay_ms, 3000);
        assert!(config.actions.is_empty());

        let action: KeyAction = serde_json::from_str(r#"{ "key": "space" }"#).unwrap();
        assert_eq!(action.hold_ms, 0);
        assert_eq!(action.wait_after_ms, 500);
    }

    #[test]
    fn test_field_name_casings() {
        let camel = r#"{ "loopCount": 1, "initialDelayMs": 10,
            "actions": [{ "key": "A", "holdMs": 5, "waitAfterMs": 7 }] }"#;
        let pascal = r#"{ "LoopCount": 1, "InitialDelayMs": 10,
            "Actions": [{ "Key": "A", "HoldMs": 5, "WaitAfterMs": 7 }] }"#;

        let a: ReplayConfig = serde_json::from_str(camel).unwrap();
        let b: ReplayConfig = serde_json::from_str(pascal).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.actions[0].hold_ms, 5);
        assert_eq!(a.actions[0].wait_after_ms, 7);
    }

    #[test]
    fn test_field_names_ignore_casing() {
        let upper = r#"{ "LOOPCOUNT": 1, "INITIALDELAYMS": 10,
            "ACTIONS": [{ "KEY": "A", "HOLDMS": 5, "WAITAFTERMS": 7 }] }"#;
        let mixed = r#"{ "Loop_Count": 1, "Initial_Delay_Ms": 10,
            "actions": [{ "kEy": "A", "hOlDmS": 5, "WaitAfterMS": 7 }] }"#;

        let a = ReplayConfig::from_json(upper).unwrap();
        let b = ReplayConfig::from_json(mixed).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.loop_count, 1);
        assert_eq!(a.initial_delay_ms, 10);
        assert_eq!(a.actions[0].hold_ms, 5);
        assert_eq!(a.actions[0].wait_after_ms, 7);
    }

    #[test]
    fn test_validate_rejects_blank_key() {
        let config = ReplayConfig {
            actions: vec![KeyAction {
                key: String::new(),
                hold_ms: 0,
                wait_after_ms: 0,
            }],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("empty key"));
    }
}
