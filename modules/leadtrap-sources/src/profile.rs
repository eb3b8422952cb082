use leadtrap_common::Borough;

/// Partition tables for one monitored market. Adapters take their fan-out
/// from here rather than hard-coding it.
pub struct MonitorProfile {
    pub boroughs: Vec<Borough>,
    pub craigslist_feeds: Vec<String>,
    pub reddit_subreddits: Vec<&'static str>,
    /// Subreddits that imply the NYC area by themselves; posts elsewhere
    /// need a textual NYC cue.
    pub reddit_nyc_subreddits: Vec<&'static str>,
    pub twitter_accounts: Vec<&'static str>,
    pub nitter_base_url: String,
}

/// The NYC pest-control market.
pub fn nyc_profile(boroughs: Vec<Borough>, nitter_base_url: String) -> MonitorProfile {
    MonitorProfile {
        boroughs,
        craigslist_feeds: vec![
            // Services wanted
            "https://newyork.craigslist.org/search/bks?format=rss&query=pest+exterminator+mice+rats+roaches".to_string(),
            "https://newyork.craigslist.org/search/que?format=rss&query=pest+exterminator+mice+rats+roaches".to_string(),
            "https://newyork.craigslist.org/search/brx?format=rss&query=pest+exterminator+mice+rats+roaches".to_string(),
            // Housing posts mentioning pests
            "https://newyork.craigslist.org/search/apa?format=rss&query=mice+rats+roaches+bedbugs".to_string(),
        ],
        reddit_subreddits: vec![
            // Main NYC subreddits
            "AskNYC", "nyc", "Brooklyn", "Queens", "Bronx",
            // Pest-specific
            "Bedbugs", "Landlord",
            // Brooklyn neighborhoods
            "Bushwick", "williamsburg", "Ridgewood", "FortGreene", "ParkSlope",
            "BayRidge", "greenpoint", "BedStuy", "crownheights",
            // Queens neighborhoods
            "astoria", "flushing", "corona", "woodside", "JacksonHeights",
            "ForestHills", "Sunnyside", "LIC", "Elmhurst",
            // Manhattan neighborhoods
            "StuyTown", "upperwestside", "harlem", "EastVillage",
            // Nassau County
            "nassaucounty", "longisland", "Hempstead", "longbeach", "Freeport",
            "ValleyStream", "Levittown", "Massapequa", "Hicksville", "Plainview",
            "Syosset", "GardenCity", "rockvillecentre", "Oceanside",
        ],
        reddit_nyc_subreddits: vec!["AskNYC", "nyc", "Brooklyn", "Queens", "Bronx"],
        twitter_accounts: vec!["NYCHousing", "NYCHA", "NYCHealthy", "nycgov"],
        nitter_base_url,
    }
}
