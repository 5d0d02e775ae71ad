//! Porter stemmer with the NLTK extensions, the variant ROUGE reference
//! scores are computed with. Operates on lowercase ASCII tokens.

#[derive(Clone, Copy)]
enum Condition {
    Always,
    PositiveMeasure,
    MeasureAbove1,
    /// (m>1 and (*S or *T)) ION
    SOrTBeforeIon,
    /// Y -> I only after a consonant, and never for a single letter stem.
    ConsonantBeforeY,
    /// LOGI -> LOG keeps the `l` with the stem when measuring.
    StemWithL,
    /// LL -> L measures the word minus one `l`.
    StemWithLAbove1,
}

impl Condition {
    fn holds(self, stem: &str) -> bool {
        match self {
            Condition::Always => true,
            Condition::PositiveMeasure => measure(stem) > 0,
            Condition::MeasureAbove1 => measure(stem) > 1,
            Condition::SOrTBeforeIon => {
                measure(stem) > 1 && matches!(stem.as_bytes().last(), Some(b's' | b't'))
            }
            Condition::ConsonantBeforeY => stem.len() > 1 && is_consonant(stem.as_bytes(), stem.len() - 1),
            Condition::StemWithL => measure(&format!("{stem}l")) > 0,
            Condition::StemWithLAbove1 => measure(&format!("{stem}l")) > 1,
        }
    }
}

type Rule = (&'static str, &'static str, Condition);

const IRREGULAR_FORMS: &[(&str, &str)] = &[
    ("sky", "sky"),
    ("skies", "sky"),
    ("dying", "die"),
    ("lying", "lie"),
    ("tying", "tie"),
    ("news", "news"),
    ("innings", "inning"),
    ("inning", "inning"),
    ("outings", "outing"),
    ("outing", "outing"),
    ("cannings", "canning"),
    ("canning", "canning"),
    ("howe", "howe"),
    ("proceed", "proceed"),
    ("exceed", "exceed"),
    ("succeed", "succeed"),
];

const STEP2_RULES: &[Rule] = &[
    ("ational", "ate", Condition::PositiveMeasure),
    ("tional", "tion", Condition::PositiveMeasure),
    ("enci", "ence", Condition::PositiveMeasure),
    ("anci", "ance", Condition::PositiveMeasure),
    ("izer", "ize", Condition::PositiveMeasure),
    ("bli", "ble", Condition::PositiveMeasure),
    ("alli", "al", Condition::PositiveMeasure),
    ("entli", "ent", Condition::PositiveMeasure),
    ("eli", "e", Condition::PositiveMeasure),
    ("ousli", "ous", Condition::PositiveMeasure),
    ("ization", "ize", Condition::PositiveMeasure),
    ("ation", "ate", Condition::PositiveMeasure),
    ("ator", "ate", Condition::PositiveMeasure),
    ("alism", "al", Condition::PositiveMeasure),
    ("iveness", "ive", Condition::PositiveMeasure),
    ("fulness", "ful", Condition::PositiveMeasure),
    ("ousness", "ous", Condition::PositiveMeasure),
    ("aliti", "al", Condition::PositiveMeasure),
    ("iviti", "ive", Condition::PositiveMeasure),
    ("biliti", "ble", Condition::PositiveMeasure),
    ("fulli", "ful", Condition::PositiveMeasure),
    ("logi", "log", Condition::StemWithL),
];

const STEP3_RULES: &[Rule] = &[
    ("icate", "ic", Condition::PositiveMeasure),
    ("ative", "", Condition::PositiveMeasure),
    ("alize", "al", Condition::PositiveMeasure),
    ("iciti", "ic", Condition::PositiveMeasure),
    ("ical", "ic", Condition::PositiveMeasure),
    ("ful", "", Condition::PositiveMeasure),
    ("ness", "", Condition::PositiveMeasure),
];

const STEP4_RULES: &[Rule] = &[
    ("al", "", Condition::MeasureAbove1),
    ("ance", "", Condition::MeasureAbove1),
    ("ence", "", Condition::MeasureAbove1),
    ("er", "", Condition::MeasureAbove1),
    ("ic", "", Condition::MeasureAbove1),
    ("able", "", Condition::MeasureAbove1),
    ("ible", "", Condition::MeasureAbove1),
    ("ant", "", Condition::MeasureAbove1),
    ("ement", "", Condition::MeasureAbove1),
    ("ment", "", Condition::MeasureAbove1),
    ("ent", "", Condition::MeasureAbove1),
    ("ion", "", Condition::SOrTBeforeIon),
    ("ou", "", Condition::MeasureAbove1),
    ("ism", "", Condition::MeasureAbove1),
    ("ate", "", Condition::MeasureAbove1),
    ("iti", "", Condition::MeasureAbove1),
    ("ous", "", Condition::MeasureAbove1),
    ("ive", "", Condition::MeasureAbove1),
    ("ize", "", Condition::MeasureAbove1),
];

pub fn stem(word: &str) -> String {
    if let Some((_, base)) = IRREGULAR_FORMS.iter().find(|(form, _)| *form == word) {
        return (*base).to_string();
    }
    if word.len() <= 2 || !word.is_ascii() {
        return word.to_string();
    }

    let word = step1a(word);
    let word = step1b(&word);
    let word = apply_rules(&word, &[("y", "i", Condition::ConsonantBeforeY)]);
    let word = step2(&word);
    let word = apply_rules(&word, STEP3_RULES);
    let word = apply_rules(&word, STEP4_RULES);
    let word = step5a(&word);
    apply_rules(&word, &[("ll", "l", Condition::StemWithLAbove1)])
}

/// Applies the first rule whose suffix matches; a failed condition stops the list.
fn apply_rules(word: &str, rules: &[Rule]) -> String {
    for &(suffix, replacement, condition) in rules {
        if let Some(stem) = word.strip_suffix(suffix) {
            return if condition.holds(stem) {
                format!("{stem}{replacement}")
            } else {
                word.to_string()
            };
        }
    }
    word.to_string()
}

fn step1a(word: &str) -> String {
    if word.len() == 4 {
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{stem}ie");
        }
    }
    apply_rules(
        word,
        &[
            ("sses", "ss", Condition::Always),
            ("ies", "i", Condition::Always),
            ("ss", "ss", Condition::Always),
            ("s", "", Condition::Always),
        ],
    )
}

fn step1b(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ied") {
        return if word.len() == 4 {
            format!("{stem}ie")
        } else {
            format!("{stem}i")
        };
    }

    if let Some(stem) = word.strip_suffix("eed") {
        return if measure(stem) > 0 {
            format!("{stem}ee")
        } else {
            word.to_string()
        };
    }

    let intermediate = ["ed", "ing"]
        .iter()
        .filter_map(|suffix| word.strip_suffix(suffix))
        .find(|stem| contains_vowel(stem));
    let Some(stem) = intermediate else {
        return word.to_string();
    };

    for (suffix, replacement) in [("at", "ate"), ("bl", "ble"), ("iz", "ize")] {
        if let Some(base) = stem.strip_suffix(suffix) {
            return format!("{base}{replacement}");
        }
    }

    if ends_double_consonant(stem) {
        return if stem.ends_with(['l', 's', 'z']) {
            stem.to_string()
        } else {
            stem[..stem.len() - 1].to_string()
        };
    }

    if measure(stem) == 1 && ends_cvc(stem) {
        format!("{stem}e")
    } else {
        stem.to_string()
    }
}

fn step2(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("alli") {
        if measure(stem) > 0 {
            return step2(&format!("{stem}al"));
        }
    }
    apply_rules(word, STEP2_RULES)
}

fn step5a(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('e') {
        let m = measure(stem);
        if m > 1 || (m == 1 && !ends_cvc(stem)) {
            return stem.to_string();
        }
    }
    word.to_string()
}

fn is_consonant(word: &[u8], i: usize) -> bool {
    match word[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_consonant(word, i - 1),
        _ => true,
    }
}

/// Number of vowel-to-consonant transitions, `m` in `[C](VC){m}[V]`.
fn measure(stem: &str) -> usize {
    let bytes = stem.as_bytes();
    let mut count = 0;
    let mut after_vowel = false;
    for i in 0..bytes.len() {
        let consonant = is_consonant(bytes, i);
        if consonant && after_vowel {
            count += 1;
        }
        after_vowel = !consonant;
    }
    count
}

fn contains_vowel(stem: &str) -> bool {
    let bytes = stem.as_bytes();
    (0..bytes.len()).any(|i| !is_consonant(bytes, i))
}

fn ends_double_consonant(word: &str) -> bool {
    let bytes = word.as_bytes();
    let n = bytes.len();
    n >= 2 && bytes[n - 1] == bytes[n - 2] && is_consonant(bytes, n - 1)
}

fn ends_cvc(word: &str) -> bool {
    let bytes = word.as_bytes();
    let n = bytes.len();
    (n >= 3
        && is_consonant(bytes, n - 3)
        && !is_consonant(bytes, n - 2)
        && is_consonant(bytes, n - 1)
        && !matches!(bytes[n - 1], b'w' | b'x' | b'y'))
        || (n == 2 && !is_consonant(bytes, 0) && is_consonant(bytes, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_porter_examples() {
        for (word, expected) in [
            ("caresses", "caress"),
            ("ponies", "poni"),
            ("ties", "tie"),
            ("cats", "cat"),
            ("agreed", "agre"),
            ("plastered", "plaster"),
            ("motoring", "motor"),
            ("hopping", "hop"),
            ("filing", "file"),
            ("falling", "fall"),
            ("happy", "happi"),
            ("relational", "relat"),
            ("generalizations", "gener"),
            ("running", "run"),
        ] {
            assert_eq!(stem(word), expected, "stem of {word}");
        }
    }

    #[test]
    fn li_endings_are_not_stripped_generically() {
        assert_eq!(stem("fairly"), "fairli");
        assert_eq!(stem("significantly"), "significantli");
        assert_eq!(stem("significant"), "signific");
    }

    #[test]
    fn irregular_forms_and_short_words() {
        assert_eq!(stem("dying"), "die");
        assert_eq!(stem("skies"), "sky");
        assert_eq!(stem("news"), "news");
        assert_eq!(stem("is"), "is");
    }
}
