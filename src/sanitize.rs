/// Display-safety filter: drops every character outside printable ASCII
/// (32..=126), keeping the rest in order. This also removes newlines, so it
/// is opt-in and applied only to displayed text, never to the wire payload.
pub fn printable_ascii(text: &str) -> String {
    text.chars().filter(|c| matches!(c, ' '..='~')).collect()
}

pub fn for_display(text: &str, sanitize: bool) -> String {
    if sanitize {
        printable_ascii(text)
    } else {
        text.to_string()
    }
}
