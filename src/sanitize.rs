/// Words masked out of chirp bodies, compared case-insensitively.
pub const BANNED_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

/// Replacement written in place of a banned word.
pub const MASK: &str = "****";

/// Mask every whitespace-delimited token that equals a banned word.
///
/// Tokens are rejoined with single spaces, so runs of whitespace collapse and
/// leading/trailing whitespace is dropped. Only whole tokens match:
/// `"kerfuffle!"` is left alone.
pub fn clean_body(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| if is_banned(word) { MASK } else { word })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_banned(word: &str) -> bool {
    let lower = word.to_lowercase();
    BANNED_WORDS.contains(&lower.as_str())
}
