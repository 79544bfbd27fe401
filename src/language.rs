//! Language label normalization.
//!
//! Stored `language` fields hold free text: ISO-639-1 codes (`"nl"`), English
//! names (`"Japanese"`), native names (`"Deutsch"`), Dutch labels written by the ingestion feed
//! (`"Nederlands"`), or a comma-joined mix. [`resolve`] maps one label to a
//! [`Language`]; [`display_name`] and [`iso_codes`] project a whole field.

/// Dutch labels the ingestion feed emits that are not ISO names.
const LOCAL_LABELS: &[(&str, &str)] = &[
    ("arabisch", "ar"),
    ("catalaans", "ca"),
    ("engels", "en"),
    ("frans", "fr"),
    ("ijslands", "is"),
    ("nederlands", "nl"),
    ("russisch", "ru"),
    ("spaans", "es"),
];

/// Native names (lowercase) of the languages that turn up in film metadata.
const NATIVE_NAMES: &[(&str, &str)] = &[
    ("afrikaans", "af"),
    ("bahasa indonesia", "id"),
    ("bahasa melayu", "ms"),
    ("български", "bg"),
    ("bosanski", "bs"),
    ("català", "ca"),
    ("čeština", "cs"),
    ("cymraeg", "cy"),
    ("dansk", "da"),
    ("deutsch", "de"),
    ("eesti", "et"),
    ("ελληνικά", "el"),
    ("español", "es"),
    ("euskara", "eu"),
    ("français", "fr"),
    ("gaeilge", "ga"),
    ("galego", "gl"),
    ("hrvatski", "hr"),
    ("íslenska", "is"),
    ("italiano", "it"),
    ("język polski", "pl"),
    ("latviešu", "lv"),
    ("lietuvių", "lt"),
    ("magyar", "hu"),
    ("македонски", "mk"),
    ("norsk", "no"),
    ("polski", "pl"),
    ("português", "pt"),
    ("română", "ro"),
    ("русский", "ru"),
    ("shqip", "sq"),
    ("slovenčina", "sk"),
    ("slovenščina", "sl"),
    ("српски", "sr"),
    ("suomi", "fi"),
    ("svenska", "sv"),
    ("tiếng việt", "vi"),
    ("türkçe", "tr"),
    ("українська", "uk"),
    ("עברית", "he"),
    ("العربية", "ar"),
    ("فارسی", "fa"),
    ("हिन्दी", "hi"),
    ("বাংলা", "bn"),
    ("ไทย", "th"),
    ("ქართული", "ka"),
    ("한국어", "ko"),
    ("中文", "zh"),
    ("日本語", "ja"),
];

/// ISO-639-1 codes with their English names.
const ISO_639_1: &[(&str, &str)] = &[
    ("aa", "Afar"),
    ("ab", "Abkhaz"),
    ("ae", "Avestan"),
    ("af", "Afrikaans"),
    ("ak", "Akan"),
    ("am", "Amharic"),
    ("an", "Aragonese"),
    ("ar", "Arabic"),
    ("as", "Assamese"),
    ("av", "Avaric"),
    ("ay", "Aymara"),
    ("az", "Azerbaijani"),
    ("ba", "Bashkir"),
    ("be", "Belarusian"),
    ("bg", "Bulgarian"),
    ("bi", "Bislama"),
    ("bm", "Bambara"),
    ("bn", "Bengali"),
    ("bo", "Tibetan"),
    ("br", "Breton"),
    ("bs", "Bosnian"),
    ("ca", "Catalan"),
    ("ce", "Chechen"),
    ("ch", "Chamorro"),
    ("co", "Corsican"),
    ("cr", "Cree"),
    ("cs", "Czech"),
    ("cu", "Old Church Slavonic"),
    ("cv", "Chuvash"),
    ("cy", "Welsh"),
    ("da", "Danish"),
    ("de", "German"),
    ("dv", "Divehi"),
    ("dz", "Dzongkha"),
    ("ee", "Ewe"),
    ("el", "Greek"),
    ("en", "English"),
    ("eo", "Esperanto"),
    ("es", "Spanish"),
    ("et", "Estonian"),
    ("eu", "Basque"),
    ("fa", "Persian"),
    ("ff", "Fula"),
    ("fi", "Finnish"),
    ("fj", "Fijian"),
    ("fo", "Faroese"),
    ("fr", "French"),
    ("fy", "Western Frisian"),
    ("ga", "Irish"),
    ("gd", "Scottish Gaelic"),
    ("gl", "Galician"),
    ("gn", "Guaraní"),
    ("gu", "Gujarati"),
    ("gv", "Manx"),
    ("ha", "Hausa"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("ho", "Hiri Motu"),
    ("hr", "Croatian"),
    ("ht", "Haitian"),
    ("hu", "Hungarian"),
    ("hy", "Armenian"),
    ("hz", "Herero"),
    ("ia", "Interlingua"),
    ("id", "Indonesian"),
    ("ie", "Interlingue"),
    ("ig", "Igbo"),
    ("ii", "Nuosu"),
    ("ik", "Inupiaq"),
    ("io", "Ido"),
    ("is", "Icelandic"),
    ("it", "Italian"),
    ("iu", "Inuktitut"),
    ("ja", "Japanese"),
    ("jv", "Javanese"),
    ("ka", "Georgian"),
    ("kg", "Kongo"),
    ("ki", "Kikuyu"),
    ("kj", "Kwanyama"),
    ("kk", "Kazakh"),
    ("kl", "Kalaallisut"),
    ("km", "Khmer"),
    ("kn", "Kannada"),
    ("ko", "Korean"),
    ("kr", "Kanuri"),
    ("ks", "Kashmiri"),
    ("ku", "Kurdish"),
    ("kv", "Komi"),
    ("kw", "Cornish"),
    ("ky", "Kyrgyz"),
    ("la", "Latin"),
    ("lb", "Luxembourgish"),
    ("lg", "Ganda"),
    ("li", "Limburgish"),
    ("ln", "Lingala"),
    ("lo", "Lao"),
    ("lt", "Lithuanian"),
    ("lu", "Luba-Katanga"),
    ("lv", "Latvian"),
    ("mg", "Malagasy"),
    ("mh", "Marshallese"),
    ("mi", "Māori"),
    ("mk", "Macedonian"),
    ("ml", "Malayalam"),
    ("mn", "Mongolian"),
    ("mr", "Marathi"),
    ("ms", "Malay"),
    ("mt", "Maltese"),
    ("my", "Burmese"),
    ("na", "Nauru"),
    ("nb", "Norwegian Bokmål"),
    ("nd", "Northern Ndebele"),
    ("ne", "Nepali"),
    ("ng", "Ndonga"),
    ("nl", "Dutch"),
    ("nn", "Norwegian Nynorsk"),
    ("no", "Norwegian"),
    ("nr", "Southern Ndebele"),
    ("nv", "Navajo"),
    ("ny", "Chichewa"),
    ("oc", "Occitan"),
    ("oj", "Ojibwe"),
    ("om", "Oromo"),
    ("or", "Oriya"),
    ("os", "Ossetian"),
    ("pa", "Panjabi"),
    ("pi", "Pāli"),
    ("pl", "Polish"),
    ("ps", "Pashto"),
    ("pt", "Portuguese"),
    ("qu", "Quechua"),
    ("rm", "Romansh"),
    ("rn", "Kirundi"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("rw", "Kinyarwanda"),
    ("sa", "Sanskrit"),
    ("sc", "Sardinian"),
    ("sd", "Sindhi"),
    ("se", "Northern Sami"),
    ("sg", "Sango"),
    ("si", "Sinhala"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("sm", "Samoan"),
    ("sn", "Shona"),
    ("so", "Somali"),
    ("sq", "Albanian"),
    ("sr", "Serbian"),
    ("ss", "Swati"),
    ("st", "Southern Sotho"),
    ("su", "Sundanese"),
    ("sv", "Swedish"),
    ("sw", "Swahili"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("tg", "Tajik"),
    ("th", "Thai"),
    ("ti", "Tigrinya"),
    ("tk", "Turkmen"),
    ("tl", "Tagalog"),
    ("tn", "Tswana"),
    ("to", "Tonga"),
    ("tr", "Turkish"),
    ("ts", "Tsonga"),
    ("tt", "Tatar"),
    ("tw", "Twi"),
    ("ty", "Tahitian"),
    ("ug", "Uyghur"),
    ("uk", "Ukrainian"),
    ("ur", "Urdu"),
    ("uz", "Uzbek"),
    ("ve", "Venda"),
    ("vi", "Vietnamese"),
    ("vo", "Volapük"),
    ("wa", "Walloon"),
    ("wo", "Wolof"),
    ("xh", "Xhosa"),
    ("yi", "Yiddish"),
    ("yo", "Yoruba"),
    ("za", "Zhuang"),
    ("zh", "Chinese"),
    ("zu", "Zulu"),
];

/// One resolved language label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Language {
    /// ISO-639-1 code, when the label could be mapped.
    pub code: Option<&'static str>,
    /// English display name, or the capitalized label when unmapped.
    pub name: String,
    /// The trimmed label as it appeared in the field.
    pub original: String,
}

/// Resolve a single label. Lookup is case-insensitive.
pub fn resolve(label: &str) -> Language {
    let original = label.trim().to_string();
    let key = original.to_lowercase();

    let code = LOCAL_LABELS
        .iter()
        .find(|(local, _)| *local == key)
        .map(|(_, code)| *code)
        .or_else(|| ISO_639_1.iter().find(|(code, _)| *code == key).map(|(code, _)| *code))
        .or_else(|| NATIVE_NAMES.iter().find(|(native, _)| *native == key).map(|(_, code)| *code))
        .or_else(|| {
            ISO_639_1
                .iter()
                .find(|(_, name)| name.to_lowercase() == key)
                .map(|(code, _)| *code)
        });

    let name = match code.and_then(english_name) {
        Some(name) => name.to_string(),
        None => capitalize(&key),
    };

    Language { code, name, original }
}

/// Every non-empty comma-separated label in `field`, resolved.
pub fn resolve_all(field: &str) -> Vec<Language> {
    field.split(',').filter(|t| !t.trim().is_empty()).map(resolve).collect()
}

/// English display form of a language field: `"nl, en"` becomes `"Dutch, English"`.
pub fn display_name(field: &str) -> String {
    resolve_all(field).into_iter().map(|l| l.name).collect::<Vec<_>>().join(", ")
}

/// ISO-code form of a language field. Unmapped labels are kept as written.
pub fn iso_codes(field: &str) -> String {
    resolve_all(field)
        .into_iter()
        .map(|l| l.code.map(str::to_string).unwrap_or(l.original))
        .collect::<Vec<_>>()
        .join(", ")
}

fn english_name(code: &str) -> Option<&'static str> {
    ISO_639_1.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}
