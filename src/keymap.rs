//! Key names a gesture binding may target.

/// Keys the injector understands, as `(accepted name, injected name)`
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("up", "up"),
    ("down", "down"),
    ("left", "left"),
    ("right", "right"),
    ("space", "space"),
    ("enter", "enter"),
    ("tab", "tab"),
    ("esc", "escape"),
    ("escape", "escape"),
    ("backspace", "backspace"),
    ("ctrl", "ctrl"),
    ("alt", "alt"),
    ("shift", "shift"),
    ("cmd", "cmd"),
    ("f1", "f1"),
    ("f2", "f2"),
    ("f3", "f3"),
    ("f4", "f4"),
    ("f5", "f5"),
    ("f6", "f6"),
    ("f7", "f7"),
    ("f8", "f8"),
    ("f9", "f9"),
    ("f10", "f10"),
    ("f11", "f11"),
    ("f12", "f12"),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key: {0:?}")]
pub struct UnknownKey(pub String);

/// Resolve a configured key name to the name handed to the injector.
/// Names are trimmed and case-insensitive; single letters and digits are
/// accepted as themselves.
pub fn normalize_key(name: &str) -> Result<String, UnknownKey> {
    let key = name.trim().to_lowercase();

    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            return Ok(key);
        }
    }

    SUPPORTED_KEYS
        .iter()
        .find(|(accepted, _)| *accepted == key)
        .map(|(_, injected)| injected.to_string())
        .ok_or(UnknownKey(key))
}
