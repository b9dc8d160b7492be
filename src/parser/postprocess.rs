//! Trailing separator repair
//!
//! Removing section tags often leaves a comma right before a closing
//! bracket (`[{"id": 1},{{/items}}]` becomes `[{"id": 1},]`). This pass
//! drops such commas and updates the [`SourceMap`] in lockstep.

use super::preprocessor::Neutralized;

/// Drop every dangling separator from neutralized text.
///
/// A comma is dangling when only whitespace or other dangling commas
/// separate it from a `]` or `}`. Commas inside string literals are left
/// alone. Running the repair twice yields the same text as running it once.
pub fn repair_trailing_separators(neutralized: Neutralized) -> Neutralized {
    let removed = find_dangling_separators(&neutralized.text);
    if removed.is_empty() {
        return neutralized;
    }

    tracing::debug!(count = removed.len(), "Removing dangling separators");

    let mut text = String::with_capacity(neutralized.text.len());
    let mut cursor = 0;
    for &offset in &removed {
        text.push_str(&neutralized.text[cursor..offset]);
        cursor = offset + 1;
    }
    text.push_str(&neutralized.text[cursor..]);

    Neutralized {
        text,
        map: neutralized.map.elide_cleaned_bytes(&removed),
        has_placeholders: neutralized.has_placeholders,
    }
}

/// Byte offsets of dangling commas, ascending
fn find_dangling_separators(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut removed = Vec::new();
    let mut pending = Vec::new();
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i];

        if in_string {
            match ch {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }

        match ch {
            b',' => pending.push(i),
            b']' | b'}' => removed.append(&mut pending),
            b' ' | b'\t' | b'\n' | b'\r' => {}
            b'"' => {
                pending.clear();
                in_string = true;
            }
            _ => pending.clear(),
        }
        i += 1;
    }

    removed
}
