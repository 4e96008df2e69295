use crate::voice::Gender;

// Known proper names and generic gender words seen in platform voice names.
// Non-exhaustive and locale-specific; female keywords are checked first, so
// a name matching both lists classifies as female.
const FEMALE_KEYWORDS: &[&str] = &[
    "female",
    "woman",
    "girl",
    "zira",
    "susan",
    "karen",
    "moira",
    "tessa",
    "samantha",
    "victoria",
    "fiona",
    "amelie",
    "anna",
    "carmit",
    "damayanti",
    "ioana",
    "jessica",
    "joana",
    "kanya",
    "kyoko",
    "laura",
    "lekha",
    "luciana",
    "mariska",
    "mei-jia",
    "melina",
    "milena",
    "mónica",
    "nora",
    "paulina",
    "satu",
    "sin-ji",
    "tessa",
    "ting-ting",
    "veena",
    "yelda",
    "zosia",
    "ellen",
    "sandy",
    "sara",
];

const MALE_KEYWORDS: &[&str] = &[
    "male", "man", "boy", "david", "mark", "george", "daniel", "james", "alex", "thomas", "xander",
    "diego", "lee", "nathan",
];

/// Classifies a voice display name by substring membership against the fixed
/// keyword lists. Female is evaluated first; anything matching neither list
/// is [`Gender::Unknown`].
pub fn classify(name: &str) -> Gender {
    let name_lower = name.to_lowercase();
    if FEMALE_KEYWORDS.iter().any(|k| name_lower.contains(k)) {
        return Gender::Female;
    }
    if MALE_KEYWORDS.iter().any(|k| name_lower.contains(k)) {
        return Gender::Male;
    }
    Gender::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn female_keyword_classifies_female() {
        assert_eq!(classify("Microsoft Zira Desktop"), Gender::Female);
        assert_eq!(classify("Samantha"), Gender::Female);
        assert_eq!(classify("Google UK English Female"), Gender::Female);
    }

    #[test]
    fn male_keyword_classifies_male() {
        assert_eq!(classify("Microsoft David"), Gender::Male);
        assert_eq!(classify("Daniel (United Kingdom)"), Gender::Male);
    }

    #[test]
    fn no_keyword_classifies_unknown() {
        assert_eq!(classify("Google US English"), Gender::Unknown);
        assert_eq!(classify("Whisper"), Gender::Unknown);
        assert_eq!(classify(""), Gender::Unknown);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("KAREN"), Gender::Female);
        assert_eq!(classify("dAvId"), Gender::Male);
    }

    #[test]
    fn matching_is_substring_based() {
        // "alexandra" matches no female keyword but contains "alex".
        assert_eq!(classify("Alexandra"), Gender::Male);
        // "woman" contains "man" but the female list is checked first.
        assert_eq!(classify("Narrator Woman"), Gender::Female);
    }

    #[test]
    fn both_lists_matching_favors_female() {
        // "female" contains "male" as a substring.
        assert_eq!(classify("Test Female Male"), Gender::Female);
    }
}
