//! Keysym name table
//!
//! Maps X keysym names to values and back for the keys that make sense in
//! a global hotkey. Single ASCII letters and digits map to their Latin-1
//! code point, function keys are computed, everything else is looked up in
//! a static table.

use crate::core::types::Keysym;

const XK_F1: Keysym = 0xffbe;
const FUNCTION_KEYS: u32 = 35;

const NAMED_KEYSYMS: &[(&str, Keysym)] = &[
    ("space", 0x0020),
    ("exclam", 0x0021),
    ("quotedbl", 0x0022),
    ("numbersign", 0x0023),
    ("dollar", 0x0024),
    ("percent", 0x0025),
    ("ampersand", 0x0026),
    ("apostrophe", 0x0027),
    ("parenleft", 0x0028),
    ("parenright", 0x0029),
    ("asterisk", 0x002a),
    ("plus", 0x002b),
    ("comma", 0x002c),
    ("minus", 0x002d),
    ("period", 0x002e),
    ("slash", 0x002f),
    ("colon", 0x003a),
    ("semicolon", 0x003b),
    ("less", 0x003c),
    ("equal", 0x003d),
    ("greater", 0x003e),
    ("question", 0x003f),
    ("at", 0x0040),
    ("bracketleft", 0x005b),
    ("backslash", 0x005c),
    ("bracketright", 0x005d),
    ("asciicircum", 0x005e),
    ("underscore", 0x005f),
    ("grave", 0x0060),
    ("braceleft", 0x007b),
    ("bar", 0x007c),
    ("braceright", 0x007d),
    ("asciitilde", 0x007e),
    ("BackSpace", 0xff08),
    ("Tab", 0xff09),
    ("Return", 0xff0d),
    ("Pause", 0xff13),
    ("Scroll_Lock", 0xff14),
    ("Escape", 0xff1b),
    ("Home", 0xff50),
    ("Left", 0xff51),
    ("Up", 0xff52),
    ("Right", 0xff53),
    ("Down", 0xff54),
    ("Page_Up", 0xff55),
    ("Page_Down", 0xff56),
    ("End", 0xff57),
    ("Print", 0xff61),
    ("Insert", 0xff63),
    ("Menu", 0xff67),
    ("Num_Lock", 0xff7f),
    ("KP_Enter", 0xff8d),
    ("Delete", 0xffff),
    ("Shift_L", 0xffe1),
    ("Shift_R", 0xffe2),
    ("Control_L", 0xffe3),
    ("Control_R", 0xffe4),
    ("Caps_Lock", 0xffe5),
    ("Shift_Lock", 0xffe6),
    ("Meta_L", 0xffe7),
    ("Meta_R", 0xffe8),
    ("Alt_L", 0xffe9),
    ("Alt_R", 0xffea),
    ("Super_L", 0xffeb),
    ("Super_R", 0xffec),
    ("Hyper_L", 0xffed),
    ("Hyper_R", 0xffee),
    ("ISO_Level3_Shift", 0xfe03),
    ("Mode_switch", 0xff7e),
];

/// Aliases accepted on input but never produced on output.
const KEYSYM_ALIASES: &[(&str, Keysym)] = &[
    ("Enter", 0xff0d),
    ("Esc", 0xff1b),
    ("Prior", 0xff55),
    ("Next", 0xff56),
];

pub const XK_SHIFT_L: Keysym = 0xffe1;
pub const XK_SHIFT_R: Keysym = 0xffe2;
pub const XK_CONTROL_L: Keysym = 0xffe3;
pub const XK_CONTROL_R: Keysym = 0xffe4;
pub const XK_CAPS_LOCK: Keysym = 0xffe5;
pub const XK_META_L: Keysym = 0xffe7;
pub const XK_META_R: Keysym = 0xffe8;
pub const XK_ALT_L: Keysym = 0xffe9;
pub const XK_ALT_R: Keysym = 0xffea;
pub const XK_SUPER_L: Keysym = 0xffeb;
pub const XK_SUPER_R: Keysym = 0xffec;
pub const XK_HYPER_L: Keysym = 0xffed;
pub const XK_HYPER_R: Keysym = 0xffee;
pub const XK_NUM_LOCK: Keysym = 0xff7f;
pub const XK_SCROLL_LOCK: Keysym = 0xff14;

/// Resolves a keysym name.
///
/// Exact matches win; otherwise the lookup falls back to a
/// case-insensitive comparison (`return` → `Return`).
pub fn keysym_from_name(name: &str) -> Option<Keysym> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            return Some(c as Keysym);
        }
    }

    if let Some(keysym) = function_key(name) {
        return Some(keysym);
    }

    NAMED_KEYSYMS
        .iter()
        .chain(KEYSYM_ALIASES)
        .find(|(n, _)| *n == name)
        .or_else(|| {
            NAMED_KEYSYMS
                .iter()
                .chain(KEYSYM_ALIASES)
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
        })
        .map(|(_, keysym)| *keysym)
}

/// Canonical name of a keysym, if it is one we know.
pub fn keysym_name(keysym: Keysym) -> Option<String> {
    if let Some(c) = char::from_u32(keysym) {
        if c.is_ascii_alphanumeric() {
            return Some(c.to_string());
        }
    }

    if (XK_F1..XK_F1 + FUNCTION_KEYS).contains(&keysym) {
        return Some(format!("F{}", keysym - XK_F1 + 1));
    }

    NAMED_KEYSYMS
        .iter()
        .find(|(_, k)| *k == keysym)
        .map(|(name, _)| name.to_string())
}

/// True for keysyms that only ever act as modifiers.
pub fn is_modifier_keysym(keysym: Keysym) -> bool {
    matches!(keysym, 0xffe1..=0xffee | XK_NUM_LOCK | XK_SCROLL_LOCK | 0xfe01..=0xfe0f | 0xff7e)
}

fn function_key(name: &str) -> Option<Keysym> {
    let digits = name.strip_prefix('F').or_else(|| name.strip_prefix('f'))?;
    let n: u32 = digits.parse().ok()?;
    if (1..=FUNCTION_KEYS).contains(&n) {
        Some(XK_F1 + n - 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_and_digits() {
        assert_eq!(keysym_from_name("t"), Some(0x74));
        assert_eq!(keysym_from_name("T"), Some(0x54));
        assert_eq!(keysym_from_name("7"), Some(0x37));
        assert_eq!(keysym_name(0x74).as_deref(), Some("t"));
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(keysym_from_name("F1"), Some(0xffbe));
        assert_eq!(keysym_from_name("f12"), Some(0xffc9));
        assert_eq!(keysym_from_name("F36"), None);
        assert_eq!(keysym_name(0xffc9).as_deref(), Some("F12"));
    }

    #[test]
    fn test_named_lookup_is_case_insensitive_fallback() {
        assert_eq!(keysym_from_name("Return"), Some(0xff0d));
        assert_eq!(keysym_from_name("return"), Some(0xff0d));
        assert_eq!(keysym_from_name("Enter"), Some(0xff0d));
        assert_eq!(keysym_name(0xff0d).as_deref(), Some("Return"));
    }

    #[test]
    fn test_printable_ascii_all_named() {
        for keysym in 0x20..=0x7e {
            let name = keysym_name(keysym).unwrap_or_else(|| panic!("no name for {keysym:#x}"));
            assert_eq!(keysym_from_name(&name), Some(keysym), "{name}");
        }
        assert_eq!(keysym_from_name("plus"), Some(0x2b));
        assert_eq!(keysym_from_name("question"), Some(0x3f));
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(keysym_from_name("NotAKey"), None);
        assert_eq!(keysym_from_name(""), None);
        assert_eq!(keysym_name(0x1234_5678), None);
    }

    #[test]
    fn test_modifier_keysyms() {
        assert!(is_modifier_keysym(XK_SHIFT_L));
        assert!(is_modifier_keysym(XK_SUPER_R));
        assert!(is_modifier_keysym(XK_NUM_LOCK));
        assert!(!is_modifier_keysym(0x74));
        assert!(!is_modifier_keysym(0xff0d));
    }
}
