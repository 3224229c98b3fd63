//! Key-name resolution.
//!
//! Maps friendly key names from the config file to Win32 virtual-key codes
//! and parses `+`-delimited expressions like `"Ctrl+Shift+S"` into an ordered
//! modifier list plus a main key.
//!
//! Reference: <https://learn.microsoft.com/en-us/windows/win32/inputdev/virtual-key-codes>

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{KprError, Result};

/// Virtual-key code as understood by the input injection layer. Opaque to
/// everything else in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u16);

/// A parsed key expression: zero or more modifiers in the order they were
/// written, plus the main key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExpression {
    pub modifiers: Vec<KeyCode>,
    pub main_key: KeyCode,
}

/// Key names outside the generated letter/digit/function/numpad ranges.
/// Names are stored lowercase; lookup lowercases the query.
const NAMED_KEYS: &[(&str, u16)] = &[
    // Modifiers use the generic VK codes, games often only respond to these
    ("ctrl", 0x11),   // VK_CONTROL
    ("lctrl", 0xA2),  // VK_LCONTROL
    ("rctrl", 0xA3),  // VK_RCONTROL
    ("alt", 0x12),    // VK_MENU
    ("lalt", 0xA4),   // VK_LMENU
    ("ralt", 0xA5),   // VK_RMENU
    ("shift", 0x10),  // VK_SHIFT
    ("lshift", 0xA0), // VK_LSHIFT
    ("rshift", 0xA1), // VK_RSHIFT
    ("win", 0x5B),    // VK_LWIN
    ("lwin", 0x5B),
    ("rwin", 0x5C),
    // Common keys
    ("enter", 0x0D),
    ("return", 0x0D),
    ("tab", 0x09),
    ("space", 0x20),
    (" ", 0x20),
    ("backspace", 0x08),
    ("delete", 0x2E),
    ("del", 0x2E),
    ("insert", 0x2D),
    ("ins", 0x2D),
    ("escape", 0x1B),
    ("esc", 0x1B),
    // Arrow keys
    ("left", 0x25),
    ("up", 0x26),
    ("right", 0x27),
    ("down", 0x28),
    // Navigation
    ("home", 0x24),
    ("end", 0x23),
    ("pageup", 0x21),
    ("pgup", 0x21),
    ("pagedown", 0x22),
    ("pgdn", 0x22),
    // Misc
    ("printscreen", 0x2C),
    ("prtsc", 0x2C),
    ("scrolllock", 0x91),
    ("pause", 0x13),
    ("capslock", 0x14),
    ("numlock", 0x90),
    // Numpad operators (digits are generated below)
    ("nummultiply", 0x6A),
    ("numadd", 0x6B),
    ("numsubtract", 0x6D),
    ("numdecimal", 0x6E),
    ("numdivide", 0x6F),
    ("numenter", 0x0D),
    // OEM keys (US layout)
    (";", 0xBA),
    ("=", 0xBB),
    (",", 0xBC),
    ("-", 0xBD),
    (".", 0xBE),
    ("/", 0xBF),
    ("`", 0xC0),
    ("[", 0xDB),
    ("\\", 0xDC),
    ("]", 0xDD),
    ("'", 0xDE),
];

/// Names that count as modifiers when they appear before the last token of
/// an expression.
const MODIFIER_NAMES: &[&str] = &[
    "ctrl", "lctrl", "rctrl", "alt", "lalt", "ralt", "shift", "lshift", "rshift", "win", "lwin",
    "rwin",
];

/// Immutable name table, built once on first use. Read-only afterwards, so
/// it is safe to share without further synchronization.
static NAME_TO_VK: LazyLock<HashMap<String, KeyCode>> = LazyLock::new(|| {
    let mut table = HashMap::new();

    // Letters A-Z (VK_A = 0x41 .. VK_Z = 0x5A)
    for (i, c) in ('a'..='z').enumerate() {
        table.insert(c.to_string(), KeyCode(0x41 + i as u16));
    }
    // Digits 0-9 (VK_0 = 0x30 .. VK_9 = 0x39)
    for (i, c) in ('0'..='9').enumerate() {
        table.insert(c.to_string(), KeyCode(0x30 + i as u16));
    }
    // Function keys F1-F12 (VK_F1 = 0x70)
    for n in 1..=12u16 {
        table.insert(format!("f{n}"), KeyCode(0x70 + n - 1));
    }
    // Numpad digits (VK_NUMPAD0 = 0x60)
    for n in 0..=9u16 {
        table.insert(format!("num{n}"), KeyCode(0x60 + n));
    }
    for &(name, vk) in NAMED_KEYS {
        table.insert(name.to_string(), KeyCode(vk));
    }
    table
});

fn is_modifier_name(token: &str) -> bool {
    MODIFIER_NAMES.iter().any(|m| token.eq_ignore_ascii_case(m))
}

/// Resolves a key name to its virtual-key code.
///
/// Lookup is case-insensitive. Surrounding whitespace is trimmed, except for
/// single-character input so that `" "` still means the space key.
///
/// # Errors
///
/// Returns [`KprError::KeyResolution`] carrying the name verbatim when the
/// key is not in the table. Callers must not substitute a default.
///
/// # Example
///
/// ```
/// use key_press_replay::key_map::resolve;
///
/// assert_eq!(resolve("Enter").unwrap(), resolve("return").unwrap());
/// assert!(resolve("unknown_key_zzz").is_err());
/// ```
pub fn resolve(name: &str) -> Result<KeyCode> {
    let normalized = if name.chars().count() == 1 {
        name
    } else {
        name.trim()
    };

    NAME_TO_VK
        .get(&normalized.to_ascii_lowercase())
        .copied()
        .ok_or_else(|| KprError::key_resolution(name))
}

/// Parses a key expression like `"Ctrl+Shift+S"` into modifiers plus a main
/// key.
///
/// The expression is split on `+`; tokens are trimmed and empty tokens are
/// dropped, so stray separators degrade gracefully. Every token except the
/// last that matches a modifier name becomes a modifier, in left-to-right
/// order. Any other token becomes (and overwrites) the main key, so in a
/// well-formed expression the last token is the main key even if it is also
/// a recognized modifier name.
///
/// # Errors
///
/// Any token that fails [`resolve`] propagates the same resolution error; an
/// expression with no usable tokens fails as a whole.
pub fn parse(expression: &str) -> Result<ParsedExpression> {
    // A lone character is a key name, not an expression: " " must stay the
    // space key and must not be eaten by token trimming.
    if expression.chars().count() == 1 {
        return Ok(ParsedExpression {
            modifiers: Vec::new(),
            main_key: resolve(expression)?,
        });
    }

    let tokens: Vec<&str> = expression
        .split('+')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    let mut modifiers = Vec::new();
    let mut main_key = None;

    for (i, token) in tokens.iter().enumerate() {
        if i < tokens.len() - 1 && is_modifier_name(token) {
            modifiers.push(resolve(token)?);
        } else {
            main_key = Some(resolve(token)?);
        }
    }

    let main_key = main_key.ok_or_else(|| KprError::key_resolution(expression))?;

    Ok(ParsedExpression { modifiers, main_key })
}
