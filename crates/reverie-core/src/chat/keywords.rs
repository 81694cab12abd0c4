//! Keyword extraction from user messages.
//!
//! Keywords drive both memory selection and lorebook matching. Extraction is
//! deliberately crude: lowercase, split on non-alphanumerics, keep tokens of
//! at least four characters, first twelve unique tokens win.

const MIN_TOKEN_LEN: usize = 4;
const MAX_KEYWORDS: usize = 12;

/// Extract retrieval keywords from a user message.
///
/// Tokens are lowercased and deduplicated in first-occurrence order. Short
/// tokens (under four characters) carry too little signal and are dropped.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut keywords: Vec<String> = Vec::new();
    for token in lowered.split(|c: char| !c.is_ascii_alphanumeric()) {
        if token.len() < MIN_TOKEN_LEN {
            continue;
        }
        if keywords.iter().any(|k| k == token) {
            continue;
        }
        keywords.push(token.to_string());
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_drops_short_tokens() {
        let keywords = extract_keywords("The DRAGON flew to Old Harbor");
        assert_eq!(keywords, vec!["dragon", "flew", "harbor"]);
    }

    #[test]
    fn splits_on_punctuation_and_deduplicates() {
        let keywords = extract_keywords("sword, sword! sword-fight");
        assert_eq!(keywords, vec!["sword", "fight"]);
    }

    #[test]
    fn caps_at_twelve_keywords() {
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india \
                    juliet kilo lima mike november";
        let keywords = extract_keywords(text);
        assert_eq!(keywords.len(), 12);
        assert_eq!(keywords.last().map(String::as_str), Some("lima"));
    }

    #[test]
    fn empty_input_yields_no_keywords() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("a an it to").is_empty());
    }

    #[test]
    fn deterministic_for_identical_input() {
        let text = "wandering merchant asks about the northern pass";
        assert_eq!(extract_keywords(text), extract_keywords(text));
    }

    #[test]
    fn digits_count_as_token_characters() {
        let keywords = extract_keywords("route66 year 2188");
        assert_eq!(keywords, vec!["route66", "2188"]);
    }
}
