//! List-valued query parameters.
//!
//! A criteria string such as `"photo.jpg,logo.png"` matches either value.
//! A literal comma inside a value is written as `\,` so it is not read as
//! a list separator.

/// Separator between the values of a list parameter.
pub const LIST_SEPARATOR: char = ',';

/// Escape a literal value so it is matched as a single list item.
pub fn escape_list_item(value: &str) -> String {
    value.replace(LIST_SEPARATOR, "\\,")
}

/// Split a list parameter into its literal values.
pub fn parse_list_param(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&LIST_SEPARATOR) => {
                current.push(LIST_SEPARATOR);
                chars.next();
            }
            LIST_SEPARATOR => items.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}
