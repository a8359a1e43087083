//! Rewrites selectors the matcher cannot compile into attribute selectors
//! that approximate them.
//!
//! Utility-class frameworks emit classes like `.gap-x-\[10px\]` or
//! `.sm\:flex`. Those become `[class*="gap-x-"]` and `[class~="sm:flex"]`.

/// Characters that make a class selector unsafe to hand to the matcher.
const UNSAFE_CHARS: [char; 6] = ['\\', ':', '~', '>', '+', '*'];

/// Sanitizes one comma-free selector fragment. `None` means drop it.
pub fn sanitize_selector(fragment: &str) -> Option<String> {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return None;
    }

    if fragment.contains('[') && fragment.contains(']') {
        let before_bracket = fragment.split('[').next().unwrap_or_default().trim();
        return before_bracket
            .strip_prefix('.')
            .map(|class_name| format!("[class*=\"{}\"]", quote_escape(&unescape(class_name))));
    }

    if has_unescaped_unsafe_char(fragment) {
        if let Some(class_name) = simple_class_name(fragment) {
            return Some(format!("[class~=\"{}\"]", quote_escape(&unescape(class_name))));
        }
    }

    Some(fragment.to_string())
}

/// Sanitizes every fragment of a selector group and joins the survivors with
/// `, `. An empty result means nothing should be queried.
pub fn sanitize_selector_group(selectors: &str) -> String {
    selectors
        .split(',')
        .filter_map(sanitize_selector)
        .collect::<Vec<_>>()
        .join(", ")
}

fn has_unescaped_unsafe_char(fragment: &str) -> bool {
    UNSAFE_CHARS
        .iter()
        .any(|&ch| fragment.contains(ch) && !fragment.contains(&format!("\\{ch}")))
}

/// `name` for a selector that is a single class token `.name`.
fn simple_class_name(fragment: &str) -> Option<&str> {
    let name = fragment.strip_prefix('.')?;
    let is_single_token =
        !name.is_empty() && !name.contains(|c: char| c.is_whitespace() || c == '.' || c == '#');
    is_single_token.then_some(name)
}

/// Resolves CSS escapes in an identifier. A backslash with nothing after it
/// (as left by cutting `.a-\[1px\]` at the bracket) is dropped.
fn unescape(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len());
    let mut chars = identifier.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let mut code = 0u32;
        let mut digits = 0;
        while digits < 6 {
            match chars.peek().and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    code = code * 16 + digit;
                    digits += 1;
                    chars.next();
                }
                None => break,
            }
        }
        if digits > 0 {
            if chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            let decoded = char::from_u32(code).filter(|_| code != 0);
            out.push(decoded.unwrap_or(char::REPLACEMENT_CHARACTER));
        } else if let Some(escaped) = chars.next() {
            out.push(escaped);
        }
    }
    out
}

/// Escapes a value for a double-quoted attribute selector string.
fn quote_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
