//! The fixed relevance vocabularies shared by the adapters: pest terms for
//! the keyword filter and NYC-area cues for the general social feeds.

/// Pest/vermin/infestation terms. Matched case-insensitively as substrings
/// of a record's descriptive text.
pub const PEST_KEYWORDS: [&str; 18] = [
    "pest control",
    "exterminator",
    "mice",
    "rats",
    "rodent",
    "roaches",
    "ants",
    "bed bug",
    "bedbug",
    "termites",
    "violation",
    "bees",
    "wasps",
    "cockroach",
    "infestation",
    "vermin",
    "mold",
    "water damage",
];

/// NYC-area cues for posts from feeds that aren't inherently NYC-scoped.
pub const NYC_CUES: [&str; 6] = ["nyc", "new york", "brooklyn", "queens", "bronx", "manhattan"];

/// Case-insensitive substring match against the pest keyword set.
pub fn matches_pest_keywords(text: &str) -> bool {
    let lower = text.to_lowercase();
    PEST_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Does the text mention an NYC-area cue?
pub fn mentions_nyc(text: &str) -> bool {
    let lower = text.to_lowercase();
    NYC_CUES.iter().any(|cue| lower.contains(cue))
}
