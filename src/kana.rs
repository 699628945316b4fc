//! Script helpers for furigana annotation.

/// Offset between a katakana code point and its hiragana counterpart.
const KATAKANA_TO_HIRAGANA_OFFSET: u32 = 0x60;

/// Returns true for characters in the katakana range that have a hiragana
/// counterpart (ァ through ヶ).
pub fn is_convertible_katakana(c: char) -> bool {
    ('\u{30A1}'..='\u{30F6}').contains(&c)
}

/// Returns true for characters in the 一 through 龯 ideograph range.
pub fn is_kanji(c: char) -> bool {
    ('\u{4E00}'..='\u{9FAF}').contains(&c)
}

/// Check whether the text contains at least one kanji.
///
/// This is a coarse gate for furigana, not a script classifier: the range
/// stops at U+9FAF and ignores the extension blocks.
pub fn contains_kanji(text: &str) -> bool {
    text.chars().any(is_kanji)
}

/// Convert katakana to hiragana, leaving every other character untouched.
///
/// ```
/// use katsuyou_rs::kana::katakana_to_hiragana;
/// assert_eq!(katakana_to_hiragana("タカイ"), "たかい");
/// assert_eq!(katakana_to_hiragana("ラーメン"), "らーめん");
/// ```
pub fn katakana_to_hiragana(text: &str) -> String {
    text.chars().map(to_hiragana).collect()
}

fn to_hiragana(c: char) -> char {
    if !is_convertible_katakana(c) {
        return c;
    }
    // ぁ..ゖ is a valid scalar range, so the shift cannot fail
    char::from_u32(c as u32 - KATAKANA_TO_HIRAGANA_OFFSET).unwrap_or(c)
}
