mod extract;

pub use extract::{SUPPORTED_EXTENSIONS, decode_upload};

/// Unicode whitespace plus the ASCII file, group, record and unit separators
/// (U+001C..=U+001F), which PDF text extraction can emit between words.
fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&ch)
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(is_separator).filter(|word| !word.is_empty())
}

/// Collapses every whitespace run into a single space and trims both ends.
pub fn normalize_whitespace(input: &str) -> String {
    words(input).collect::<Vec<_>>().join(" ")
}

pub fn word_count(text: &str) -> usize {
    words(text).count()
}

/// Naive sentence count: the number of `.` characters.
pub fn sentence_count(text: &str) -> usize {
    text.matches('.').count()
}
