//! Domain gate for the chat assistant.
//! Decides from the message text alone whether it is about Dota 2.
use tracing::debug;

/// Anything that can decide domain membership for a chat message.
pub trait DomainClassifier: Send + Sync {
    fn is_in_domain(&self, text: &str) -> bool;
}

/// Keyword fragments in English and Russian, matched on lowercased text.
/// Longer entries are substring stems ("стратег", "tournament"). Short Latin
/// entries must be a whole word or its plural, short Cyrillic entries a word
/// prefix (see [`Keyword`]).
const DEFAULT_KEYWORDS: &[&str] = &[
    // game
    "dota", "дота", "доту", "доте", "valve", "steam",
    // heroes and abilities
    "hero", "герой", "геро", "ability", "abilities", "скилл", "способност", "ultimate", "ультимейт",
    // items and builds
    "item", "предмет", "айтем", "артефакт", "build", "билд", "сборк", "закуп", "blink", "блинк",
    "bkb", "aghanim", "аганим",
    // strategy and meta
    "strategy", "стратег", "tactic", "тактик", "meta", "мета", "patch", "патч", "nerf", "нерф",
    "buff", "counter", "контрпик", "pick", "пик", "draft", "драфт",
    // roles and lanes
    "role", "роль", "роли", "carry", "керри", "support", "саппорт", "mid", "мид", "offlane",
    "оффлейн", "хардлайн", "jungle", "лес", "initiator", "инициатор", "disabler", "nuker",
    // map
    "map", "карта", "карте", "lane", "лайн", "линия", "roshan", "рошан", "rune", "руна", "руны",
    "tower", "башн", "ward", "вард", "creep", "крип", "farm", "фарм", "gank", "ганк",
    "radiant", "dire",
    // competitive
    "tournament", "турнир", "the international", "интернешнл", "major", "мейджор", "esport",
    "киберспорт", "mmr", "ммр", "ranked", "рейтинг",
    // frequently asked heroes
    "pudge", "пудж", "invoker", "инвокер", "anti-mage", "antimage", "антимаг", "juggernaut",
    "джаггернаут", "джагер", "phantom assassin", "фантом", "shadow fiend", "невермор", "crystal maiden",
    "axe", "sniper", "снайпер", "earthshaker", "шейкер", "lion", "лион", "zeus", "зевс",
    "slark", "сларк", "techies", "течис", "meepo", "мипо", "rubick", "рубик", "windranger",
    "виндрейнджер", "storm spirit", "шторм", "templar assassin", "темпларка",
];

/// Entries up to this many characters are matched per word.
const SHORT_KEYWORD_CHARS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Keyword {
    /// Substring anywhere in the text
    Fragment(String),
    /// Whole word, optionally with an English plural ending
    Word(String),
    /// Start of a word, for inflected Russian stems
    Stem(String),
}

impl Keyword {
    fn parse(raw: &str) -> Option<Self> {
        let keyword = raw.trim().to_lowercase();
        if keyword.is_empty() {
            return None;
        }

        let is_single_word = keyword.chars().all(char::is_alphanumeric);
        if !is_single_word || keyword.chars().count() > SHORT_KEYWORD_CHARS {
            Some(Keyword::Fragment(keyword))
        } else if keyword.is_ascii() {
            Some(Keyword::Word(keyword))
        } else {
            Some(Keyword::Stem(keyword))
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Keyword::Fragment(k) | Keyword::Word(k) | Keyword::Stem(k) => k,
        }
    }

    fn matches(&self, text: &str, words: &[&str]) -> bool {
        match self {
            Keyword::Fragment(k) => text.contains(k.as_str()),
            Keyword::Word(k) => words.iter().any(|w| {
                w.strip_prefix(k.as_str())
                    .is_some_and(|rest| matches!(rest, "" | "s" | "es"))
            }),
            Keyword::Stem(k) => words.iter().any(|w| w.starts_with(k.as_str())),
        }
    }
}

pub struct KeywordClassifier {
    keywords: Vec<Keyword>,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self::with_keywords(DEFAULT_KEYWORDS.iter().copied())
    }

    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .filter_map(|k| Keyword::parse(k.as_ref()))
                .collect(),
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainClassifier for KeywordClassifier {
    fn is_in_domain(&self, text: &str) -> bool {
        let text_lower = text.to_lowercase();
        let words: Vec<&str> = text_lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        match self.keywords.iter().find(|k| k.matches(&text_lower, &words)) {
            Some(keyword) => {
                debug!("Message in domain: matched '{}'", keyword.as_str());
                true
            }
            None => {
                debug!("Message out of domain: no keyword matched");
                false
            }
        }
    }
}
