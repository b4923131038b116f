//! Small text helpers shared by the session types.

use std::sync::OnceLock;

use regex::Regex;

static CITATION_PATTERN: OnceLock<Regex> = OnceLock::new();

/// The response-language contract appended to every instruction string.
pub(crate) fn language_instruction(language: &str) -> String {
    format!("Please return the response in {language}")
}

/// Remove embedded citation markers (`【...】`, non-greedy) from text.
pub fn strip_citations(text: &str) -> String {
    let pattern = CITATION_PATTERN
        .get_or_init(|| Regex::new(r"【.*?】").expect("citation pattern is valid"));
    pattern.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_single_citation() {
        assert_eq!(strip_citations("Result【12†source】done"), "Resultdone");
    }

    #[test]
    fn strips_multiple_citations_non_greedily() {
        assert_eq!(
            strip_citations("a【1†x】b【2†y】c"),
            "abc",
            "each marker is matched separately"
        );
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(strip_citations("no markers here"), "no markers here");
    }

    #[test]
    fn language_contract_wording() {
        assert_eq!(
            language_instruction("French"),
            "Please return the response in French"
        );
    }
}
