use regex::Regex;

/// Names extracted from interviewer-prompted letter-by-letter spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpelledNames {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Lower-case the text and collapse spelled-out letter runs
/// ("j o h n", "j-o-h-n") into contiguous words ("john").
///
/// Idempotent: already-normalized text passes through unchanged.
pub fn normalize_spelled_name(text: &str) -> String {
    // A run of standalone letters separated by single spaces or dashes.
    let run = Regex::new(r"\b[a-z](?:[ -][a-z])+\b").unwrap();
    let lowered = text.to_lowercase();

    run.replace_all(&lowered, |caps: &regex::Captures| {
        caps[0]
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
    })
    .into_owned()
}

/// Scan transcript lines for the fixed interviewer spelling prompts and pull
/// the letter-sequence answer from the following line.
///
/// Interviewer-prompted spelling is a much higher-confidence signal than
/// free-form parsing, so callers treat these names as authoritative.
pub fn extract_spelled_names(transcript: &str) -> SpelledNames {
    let lines: Vec<&str> = transcript.split('\n').collect();
    let mut names = SpelledNames::default();

    // Single letters separated by whitespace or dashes ("j e n n i s e r",
    // "c-o-l-e-c-i-o"); also accepts an already-joined word.
    let letter_sequence = Regex::new(r"(?i)^[a-z](?:\s*[a-z]|-[a-z])*$").unwrap();
    let speaker_tag = Regex::new(r"^\[Speaker:\d+\]\s*").unwrap();

    for (i, raw_line) in lines.iter().enumerate() {
        let line = raw_line.to_lowercase();

        let is_first_prompt = line.contains("verify the spelling") && line.contains("first name");
        let is_last_prompt = line.contains("spell your last name");
        if !is_first_prompt && !is_last_prompt {
            continue;
        }

        let Some(next_line) = lines.get(i + 1) else {
            continue;
        };
        let answer = speaker_tag.replace(next_line, "");
        let answer = answer.trim();
        if !letter_sequence.is_match(answer) {
            continue;
        }

        let joined: String = answer
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        let name = capitalize(&joined);

        if is_first_prompt {
            names.first_name = Some(name);
        } else {
            names.last_name = Some(name);
        }
    }

    names
}

/// Upper-case the first letter, lower-case the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_spaced_letters() {
        assert_eq!(
            normalize_spelled_name("my name is j e n n i f e r thanks"),
            "my name is jennifer thanks"
        );
    }

    #[test]
    fn test_normalize_collapses_dashed_letters() {
        assert_eq!(normalize_spelled_name("C-O-L-E-C-I-O"), "colecio");
    }

    #[test]
    fn test_normalize_leaves_plain_words_alone() {
        assert_eq!(
            normalize_spelled_name("The quick brown fox"),
            "the quick brown fox"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_spelled_name("spell it j o h n please");
        let twice = normalize_spelled_name(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_extracts_first_name_without_spell_correcting() {
        let transcript = "[Speaker:1] can you verify the spelling of your first name\n[Speaker:2] j e n n i s e r";
        let names = extract_spelled_names(transcript);
        // Letters reassembled exactly as spoken - no correction to "Jennifer"
        assert_eq!(names.first_name.as_deref(), Some("Jenniser"));
        assert_eq!(names.last_name, None);
    }

    #[test]
    fn test_extracts_dashed_last_name() {
        let transcript =
            "[Speaker:1] okay can you please spell your last name for me\n[Speaker:3] c-o-l-e-c-i-o";
        let names = extract_spelled_names(transcript);
        assert_eq!(names.last_name.as_deref(), Some("Colecio"));
    }

    #[test]
    fn test_extracts_both_names() {
        let transcript = "\
[Speaker:1] can you verify the spelling of your first name please
[Speaker:2] k i p p
[Speaker:1] and can you please spell your last name for me
[Speaker:2] D O E";
        let names = extract_spelled_names(transcript);
        assert_eq!(names.first_name.as_deref(), Some("Kipp"));
        assert_eq!(names.last_name.as_deref(), Some("Doe"));
    }

    #[test]
    fn test_no_trigger_phrase_yields_nothing() {
        let transcript = "[Speaker:1] what is your name\n[Speaker:2] j o h n";
        assert_eq!(extract_spelled_names(transcript), SpelledNames::default());
    }

    #[test]
    fn test_answer_must_be_letter_sequence() {
        let transcript = "[Speaker:1] can you verify the spelling of your first name\n[Speaker:2] sure it's spelled j o h n";
        let names = extract_spelled_names(transcript);
        assert_eq!(names.first_name, None);
    }

    #[test]
    fn test_trigger_on_final_line_is_ignored() {
        let transcript = "[Speaker:1] can you verify the spelling of your first name";
        assert_eq!(extract_spelled_names(transcript), SpelledNames::default());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("jenniser"), "Jenniser");
        assert_eq!(capitalize("DOE"), "Doe");
        assert_eq!(capitalize(""), "");
    }
}
