use unicode_segmentation::UnicodeSegmentation;

/// Splits free text into ordered sentence strings.
///
/// Output preserves source order and never contains empty or
/// whitespace-only entries.
pub trait SentenceSegmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<String>;
}

/// Always followed by a name, so never the end of a sentence.
const TITLES: &[&str] = &[
    "Mr.", "Mrs.", "Ms.", "Dr.", "Prof.", "Sr.", "Jr.", "St.", "Mt.", "Gen.", "Gov.", "Sen.",
    "Rep.",
];

/// May end a sentence; only continue it when the next fragment does not
/// start a new one.
const ABBREVIATIONS: &[&str] = &[
    "vs.", "etc.", "i.e.", "e.g.", "Inc.", "Ltd.", "Corp.", "Co.", "No.", "Vol.", "Ch.", "Fig.",
    "Eq.", "Sec.", "Jan.", "Feb.", "Mar.", "Apr.", "Jun.", "Jul.", "Aug.", "Sep.", "Sept.",
    "Oct.", "Nov.", "Dec.", "approx.", "ca.", "c.",
];

/// UAX #29 sentence boundaries, with a second pass that rejoins fragments
/// split after a title, an abbreviation, or an initialism such as `U.S.`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSegmenter;

impl UnicodeSegmenter {
    pub fn new() -> Self {
        Self
    }

    /// Whether `next` continues the sentence in `pending` rather than
    /// starting a new one.
    fn continues(pending: &str, next: &str) -> bool {
        let mut words = pending.split_whitespace().rev();
        let Some(last_word) = words.next() else {
            return false;
        };
        let last_word = last_word.trim_start_matches(['(', '"', '\'']);
        let next_is_lowercase = next
            .chars()
            .next()
            .is_some_and(|c| c.is_lowercase() || c.is_ascii_digit());

        if TITLES.contains(&last_word) {
            return true;
        }
        if ABBREVIATIONS.contains(&last_word) {
            return next_is_lowercase;
        }

        // "U.S.", "a.m.", "F."
        let parts: Vec<&str> = last_word.split_terminator('.').collect();
        let is_initialism = last_word.ends_with('.')
            && !parts.is_empty()
            && parts
                .iter()
                .all(|part| part.chars().count() == 1 && part.chars().all(char::is_alphabetic));
        if !is_initialism {
            return false;
        }
        if next_is_lowercase {
            return true;
        }

        // A lone initial after a capitalised word is a middle initial, as in
        // "John F. Kennedy"; "vitamin C." ends its sentence.
        parts.len() == 1
            && words
                .next()
                .and_then(|word| word.chars().next())
                .is_some_and(char::is_uppercase)
    }
}

impl SentenceSegmenter for UnicodeSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        let mut sentences: Vec<String> = Vec::new();
        let mut pending = String::new();

        for fragment in text.unicode_sentences().map(str::trim) {
            if fragment.is_empty() {
                continue;
            }

            if pending.is_empty() {
                pending.push_str(fragment);
            } else if Self::continues(&pending, fragment) {
                pending.push(' ');
                pending.push_str(fragment);
            } else {
                sentences.push(std::mem::replace(&mut pending, fragment.to_string()));
            }
        }

        if !pending.trim().is_empty() {
            sentences.push(pending);
        }

        sentences
    }
}

/// Segments every document and concatenates the sentences, preserving
/// document order.
pub fn segment_all(segmenter: &dyn SentenceSegmenter, docs: &[String]) -> Vec<String> {
    docs.iter().flat_map(|doc| segmenter.segment(doc)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn segment(text: &str) -> Vec<String> {
        UnicodeSegmenter::new().segment(text)
    }

    #[test]
    fn test_basic_sentences_in_order() {
        assert_eq!(
            segment("Paris is in France. Berlin is in Germany! Is Rome in Italy?"),
            vec![
                "Paris is in France.",
                "Berlin is in Germany!",
                "Is Rome in Italy?"
            ]
        );
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(segment("").is_empty());
        assert!(segment("   \n\t ").is_empty());
    }

    #[test]
    fn test_single_sentence_without_terminator() {
        assert_eq!(segment("Bananas are yellow"), vec!["Bananas are yellow"]);
    }

    #[test]
    fn test_titles_do_not_split() {
        assert_eq!(
            segment("Dr. Smith visited Paris. He liked it."),
            vec!["Dr. Smith visited Paris.", "He liked it."]
        );
    }

    #[test]
    fn test_middle_initials_do_not_split() {
        assert_eq!(
            segment("John F. Kennedy was president. He lived in Boston."),
            vec!["John F. Kennedy was president.", "He lived in Boston."]
        );
    }

    #[test]
    fn test_sentence_ending_in_initial_or_initialism_splits() {
        assert_eq!(
            segment("He took vitamin C. Bananas are yellow."),
            vec!["He took vitamin C.", "Bananas are yellow."]
        );
        assert_eq!(
            segment("She moved to the U.S. Bananas are yellow."),
            vec!["She moved to the U.S.", "Bananas are yellow."]
        );
    }

    #[test]
    fn test_abbreviation_before_lowercase_continues() {
        assert_eq!(
            segment("Apples, pears etc. are fruit. Bananas are yellow."),
            vec!["Apples, pears etc. are fruit.", "Bananas are yellow."]
        );
        assert_eq!(
            segment("They sold apples, pears etc. Bananas are yellow."),
            vec!["They sold apples, pears etc.", "Bananas are yellow."]
        );
    }

    #[test]
    fn test_multiline_and_unicode() {
        let sentences = segment("Hello world.\n\nΚαλημέρα κόσμε!  你好。");
        assert!(sentences.len() >= 3);
        assert_eq!(sentences[0], "Hello world.");
        assert!(sentences.iter().all(|s| !s.trim().is_empty()));
    }

    #[test]
    fn test_segment_all_preserves_document_order() {
        let docs = vec![
            "First doc one. First doc two.".to_string(),
            String::new(),
            "Second doc.".to_string(),
        ];
        assert_eq!(
            segment_all(&UnicodeSegmenter::new(), &docs),
            vec!["First doc one.", "First doc two.", "Second doc."]
        );
    }
}
