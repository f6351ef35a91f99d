//! Whitespace normalization of block bodies before statement splitting.

/// Normalize the source between `<xtml>` and `</xtml>`: tabs, newlines and
/// carriage returns are dropped, and remaining whitespace runs collapse to a
/// single space. String literals keep their spaces, collapsed to single
/// spaces as well. Escapes are not interpreted here; strings cannot span the
/// dropped characters.
pub fn preprocess(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut in_string = false;
    let mut last_was_space = false;

    for ch in content.chars() {
        if matches!(ch, '\t' | '\n' | '\r') {
            continue;
        }

        if ch == '"' {
            in_string = !in_string;
            result.push(ch);
            last_was_space = false;
            continue;
        }

        if ch.is_whitespace() && !in_string {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
            continue;
        }

        if in_string && ch == ' ' {
            if !last_was_space {
                result.push(ch);
                last_was_space = true;
            }
        } else {
            result.push(ch);
            last_was_space = false;
        }
    }

    result
}
