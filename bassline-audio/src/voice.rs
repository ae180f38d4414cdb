//! Static inventory of synthesis voices and query resolution.

/// One entry in the voice inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    pub name: &'static str,
    pub gender: &'static str,
    pub lang: &'static str,
}

const fn v(name: &'static str, gender: &'static str, lang: &'static str) -> Voice {
    Voice { name, gender, lang }
}

const VOICES: &[Voice] = &[
    v("Naja", "female", "dv"),
    v("Mads", "male", "dv"),
    v("Lotte", "female", "nl"),
    v("Ruben", "male", "nl"),
    v("Joanna", "female", "en-us"),
    v("Salli", "female", "en-us"),
    v("Kimberly", "female", "en-us"),
    v("Kendra", "female", "en-us"),
    v("Ivy", "female", "en-us"),
    v("Matthew", "male", "en-us"),
    v("Justin", "male", "en-us"),
    v("Joey", "male", "en-us"),
    v("Nicole", "female", "en-au"),
    v("Russell", "male", "en-au"),
    v("Emma", "female", "en-gb"),
    v("Amy", "female", "en-gb"),
    v("Brian", "male", "en-gb"),
    v("Aditi", "female", "en-in"),
    v("Raveena", "female", "en-in"),
    v("Geraint", "male", "cy"),
    v("Chantal", "female", "fr-ca"),
    v("Celine", "female", "fr"),
    v("Mathieu", "male", "fr"),
    v("Vicki", "female", "de"),
    v("Marlene", "female", "de"),
    v("Hans", "male", "de"),
    v("Dora", "female", "is"),
    v("Karl", "male", "is"),
    v("Carla", "female", "it"),
    v("Giorgio", "male", "it"),
    v("Mizuki", "female", "ja"),
    v("Takumi", "male", "ja"),
    v("Seoyeon", "female", "ko"),
    v("Liv", "female", "no"),
    v("Ewa", "female", "pl"),
    v("Maja", "female", "pl"),
    v("Jan", "male", "pl"),
    v("Jacek", "male", "pl"),
    v("Ines", "female", "pt"),
    v("Cristiano", "male", "pt"),
    v("Vitoria", "female", "pt-br"),
    v("Ricardo", "male", "pt-br"),
    v("Carmen", "female", "ro"),
    v("Tatyana", "female", "ru"),
    v("Maxim", "male", "ru"),
    v("Conchita", "female", "es"),
    v("Enrique", "male", "es"),
    v("Penelope", "female", "es-us"),
    v("Miguel", "male", "es-us"),
    v("Astrid", "female", "sv"),
    v("Filiz", "female", "tr"),
    v("Gwyneth", "female", "cy"),
];

static DEFAULT_VOICE: Voice = v("Joanna", "female", "en-us");

/// Finds a voice by query: a language code (`"en-gb"`), a language code
/// and gender (`"en, male"`), or a voice name (`"Brian"`). Language codes
/// match by prefix; the first inventory entry wins. Falls back to a name
/// match when no language matches.
pub fn lookup(query: &str) -> Option<&'static Voice> {
    let by_lang = if let Some((lang, gender)) = query.split_once(',') {
        let lang = lang.trim();
        let gender = gender.trim().to_lowercase();
        VOICES
            .iter()
            .find(|v| v.gender == gender && v.lang.starts_with(lang))
    } else {
        let lang = query.trim();
        VOICES.iter().find(|v| v.lang.starts_with(lang))
    };

    by_lang.or_else(|| {
        let name = query.trim().to_lowercase();
        VOICES.iter().find(|v| v.name.to_lowercase() == name)
    })
}

/// Resolves a query with the fallback chain used for chat-driven speech:
/// the full query, then its two-letter language prefix, then English.
pub fn lookup_or_english(query: &str) -> &'static Voice {
    if let Some(voice) = lookup(query) {
        return voice;
    }
    if let Some(prefix) = query.trim().get(..2) {
        if let Some(voice) = lookup(prefix) {
            return voice;
        }
    }
    lookup("en").unwrap_or(&DEFAULT_VOICE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_language_code_prefix() {
        let voice = lookup("en").unwrap();
        assert_eq!(voice.name, "Joanna");

        let voice = lookup("en-gb").unwrap();
        assert_eq!(voice.name, "Emma");
    }

    #[test]
    fn lookup_by_language_and_gender() {
        let voice = lookup("en, male").unwrap();
        assert_eq!(voice.name, "Matthew");
        assert_eq!(voice.gender, "male");

        let voice = lookup("pt-br, male").unwrap();
        assert_eq!(voice.name, "Ricardo");
    }

    #[test]
    fn lookup_by_voice_name_is_case_insensitive() {
        let voice = lookup("brian").unwrap();
        assert_eq!(voice.lang, "en-gb");

        let voice = lookup("MIZUKI").unwrap();
        assert_eq!(voice.lang, "ja");
    }

    #[test]
    fn lookup_unknown_returns_none() {
        assert!(lookup("xx").is_none());
        assert!(lookup("xx, male").is_none());
    }

    #[test]
    fn fallback_chain_trims_regional_code_then_defaults() {
        // "fr-be" is not in the table, but its 2-letter prefix is.
        let voice = lookup_or_english("fr-be");
        assert_eq!(voice.lang, "fr-ca");

        let voice = lookup_or_english("zz-zz");
        assert!(voice.lang.starts_with("en"));
    }
}
