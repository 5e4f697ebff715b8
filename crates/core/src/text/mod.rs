//! Text canonicalization applied identically to the reference sentence and
//! the recognizer transcript, so token indices stay comparable.

/// Punctuation stripped before comparison. Apostrophes are deliberately
/// kept so contractions ("don't") survive as single tokens.
const PUNCTUATION: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~";

/// Lower-cases, strips the fixed punctuation class, and collapses
/// consecutive whitespace into single spaces. Pure and deterministic.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !PUNCTUATION.contains(*c))
        .collect();

    let mut out = String::with_capacity(stripped.len());
    let mut last_was_space = false;
    for c in stripped.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

/// Normalizes and splits into non-empty word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Hello, World!"), "hello world");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(normalize("a  b\t\tc\n d"), "a b c d");
    }

    #[test]
    fn keeps_apostrophes() {
        assert_eq!(tokenize("Don't stop."), vec!["don't", "stop"]);
    }

    #[test]
    fn tokenize_drops_empty_tokens() {
        assert_eq!(tokenize("  ... !!!  "), Vec::<String>::new());
        assert_eq!(tokenize(" the  cat "), vec!["the", "cat"]);
    }

    #[test]
    fn deterministic_for_same_input() {
        let s = "The CAT, sat; on   the mat?!";
        assert_eq!(normalize(s), normalize(s));
        assert_eq!(tokenize(s), tokenize(s));
    }

    #[test]
    fn reference_and_transcript_normalize_identically() {
        // Same sentence arriving with different casing/punctuation must
        // yield the same token sequence.
        assert_eq!(tokenize("The cat sat."), tokenize("the CAT sat"));
    }
}
