use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed set of monitored feeds. `key()` is the identifier used in the
/// ledger file and must stay stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Hpd,
    Dob,
    Ecb,
    Dohmh,
    Complaints311,
    Craigslist,
    Reddit,
    Twitter,
}

impl SourceKind {
    pub const ALL: [SourceKind; 8] = [
        SourceKind::Hpd,
        SourceKind::Dob,
        SourceKind::Ecb,
        SourceKind::Dohmh,
        SourceKind::Complaints311,
        SourceKind::Craigslist,
        SourceKind::Reddit,
        SourceKind::Twitter,
    ];

    /// Stable ledger key for this source.
    pub fn key(&self) -> &'static str {
        match self {
            SourceKind::Hpd => "hpd",
            SourceKind::Dob => "dob",
            SourceKind::Ecb => "ecb",
            SourceKind::Dohmh => "dohmh",
            SourceKind::Complaints311 => "311",
            SourceKind::Craigslist => "craigslist",
            SourceKind::Reddit => "reddit",
            SourceKind::Twitter => "twitter",
        }
    }

    /// Reverse of `key()`. Unknown keys (from a newer or older ledger file)
    /// return `None` and are ignored by the caller.
    pub fn from_key(key: &str) -> Option<SourceKind> {
        SourceKind::ALL.iter().copied().find(|k| k.key() == key)
    }

    /// Human-readable section label for the digest.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Hpd => "HPD Housing Violations",
            SourceKind::Dob => "DOB Building Violations",
            SourceKind::Ecb => "ECB/OATH Violations",
            SourceKind::Dohmh => "DOHMH Restaurant Violations",
            SourceKind::Complaints311 => "NYC 311 Complaints",
            SourceKind::Craigslist => "Craigslist Posts",
            SourceKind::Reddit => "Reddit Posts",
            SourceKind::Twitter => "Twitter/X Posts",
        }
    }

    /// Regulatory-violation sources carry a parcel key and are eligible for
    /// owner/business enrichment.
    pub fn carries_parcel(&self) -> bool {
        matches!(self, SourceKind::Hpd | SourceKind::Dob | SourceKind::Ecb)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// NYC borough. Open-data hosts disagree on spelling (upper vs. title case
/// vs. numeric code), so each adapter picks the representation its dataset
/// uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Borough {
    Manhattan,
    Bronx,
    Brooklyn,
    Queens,
    StatenIsland,
}

impl Borough {
    /// DOF/DCP numeric borough code (1 = Manhattan .. 5 = Staten Island).
    pub fn code(&self) -> u8 {
        match self {
            Borough::Manhattan => 1,
            Borough::Bronx => 2,
            Borough::Brooklyn => 3,
            Borough::Queens => 4,
            Borough::StatenIsland => 5,
        }
    }

    pub fn upper_name(&self) -> &'static str {
        match self {
            Borough::Manhattan => "MANHATTAN",
            Borough::Bronx => "BRONX",
            Borough::Brooklyn => "BROOKLYN",
            Borough::Queens => "QUEENS",
            Borough::StatenIsland => "STATEN ISLAND",
        }
    }

    pub fn title_name(&self) -> &'static str {
        match self {
            Borough::Manhattan => "Manhattan",
            Borough::Bronx => "Bronx",
            Borough::Brooklyn => "Brooklyn",
            Borough::Queens => "Queens",
            Borough::StatenIsland => "Staten Island",
        }
    }

    pub fn parse(s: &str) -> Option<Borough> {
        match s.trim().to_uppercase().as_str() {
            "MANHATTAN" => Some(Borough::Manhattan),
            "BRONX" => Some(Borough::Bronx),
            "BROOKLYN" => Some(Borough::Brooklyn),
            "QUEENS" => Some(Borough::Queens),
            "STATEN ISLAND" | "STATENISLAND" => Some(Borough::StatenIsland),
            _ => None,
        }
    }
}

/// Ten-digit borough-block-lot key: 1-digit borough code, 5-digit zero-padded
/// block, 4-digit zero-padded lot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParcelId(String);

impl ParcelId {
    /// Parse a raw BBL string. Rejects wrong length, non-digits, and borough
    /// codes outside 1-5.
    pub fn parse(raw: &str) -> Option<ParcelId> {
        let trimmed = raw.trim();
        if trimmed.len() != 10 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !(b'1'..=b'5').contains(&trimmed.as_bytes()[0]) {
            return None;
        }
        Some(ParcelId(trimmed.to_string()))
    }

    /// Compose a BBL from separate borough/block/lot columns (datasets that
    /// don't carry a single `bbl` field).
    pub fn from_parts(borough_code: u8, block: &str, lot: &str) -> Option<ParcelId> {
        if !(1..=5).contains(&borough_code) {
            return None;
        }
        let block: u32 = block.trim().parse().ok()?;
        let lot: u32 = lot.trim().parse().ok()?;
        if block > 99_999 || lot > 9_999 {
            return None;
        }
        Some(ParcelId(format!("{borough_code}{block:05}{lot:04}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Borough code (first digit).
    pub fn borough(&self) -> u8 {
        self.0.as_bytes()[0] - b'0'
    }

    /// Block as an integer, leading zeros stripped (reference datasets key on
    /// the non-padded value).
    pub fn block(&self) -> u32 {
        self.0[1..6].parse().unwrap_or(0)
    }

    /// Lot as an integer, leading zeros stripped.
    pub fn lot(&self) -> u32 {
        self.0[6..10].parse().unwrap_or(0)
    }
}

impl fmt::Display for ParcelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One labeled metadata line on a lead (rendered as `Label: value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub label: &'static str,
    pub value: String,
}

impl Detail {
    pub fn new(label: &'static str, value: impl Into<String>) -> Detail {
        Detail {
            label,
            value: value.into(),
        }
    }
}

/// Normalized projection of one raw upstream record. Produced by an adapter
/// immediately after fetch; downstream code never re-guesses field presence.
#[derive(Debug, Clone)]
pub struct Lead {
    pub source: SourceKind,
    /// Unique within `source`, stable across runs for the same record.
    pub id: String,
    /// Display address or post title.
    pub title: String,
    pub description: String,
    pub details: Vec<Detail>,
    pub link: Option<String>,
    /// Visual-priority flag (e.g. HPD class C). Flagged leads are not
    /// filtered differently, only rendered differently.
    pub emergency: bool,
    pub parcel: Option<ParcelId>,
    pub owner: Option<OwnerInfo>,
}

/// First-stage enrichment: recorded owner of the lead's parcel.
#[derive(Debug, Clone)]
pub struct OwnerInfo {
    pub name: String,
    pub mailing_address: Option<String>,
    pub entity: Option<BusinessEntityInfo>,
}

/// Second-stage enrichment: closest business-registry match for the owner.
#[derive(Debug, Clone)]
pub struct BusinessEntityInfo {
    pub entity_type: Option<String>,
    pub status: String,
    pub registered_agent: Option<String>,
    pub office_address: Option<String>,
    pub lookup_url: String,
}

/// Truncate to at most `max` characters on a char boundary.
pub fn snippet(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_key_roundtrip() {
        for kind in SourceKind::ALL {
            assert_eq!(SourceKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(SourceKind::from_key("myspace"), None);
    }

    #[test]
    fn parcel_sources() {
        assert!(SourceKind::Hpd.carries_parcel());
        assert!(SourceKind::Ecb.carries_parcel());
        assert!(!SourceKind::Reddit.carries_parcel());
        assert!(!SourceKind::Dohmh.carries_parcel());
    }

    #[test]
    fn parcel_decomposes_with_leading_zeros_stripped() {
        let p = ParcelId::parse("3012340045").unwrap();
        assert_eq!(p.borough(), 3);
        assert_eq!(p.block(), 1234);
        assert_eq!(p.lot(), 45);
    }

    #[test]
    fn parcel_rejects_malformed_keys() {
        assert!(ParcelId::parse("").is_none());
        assert!(ParcelId::parse("301234004").is_none()); // 9 digits
        assert!(ParcelId::parse("30123400456").is_none()); // 11 digits
        assert!(ParcelId::parse("3O12340045").is_none()); // letter O
        assert!(ParcelId::parse("6012340045").is_none()); // borough 6
        assert!(ParcelId::parse("0012340045").is_none()); // borough 0
    }

    #[test]
    fn parcel_from_parts_pads() {
        let p = ParcelId::from_parts(3, "1234", "45").unwrap();
        assert_eq!(p.as_str(), "3012340045");
        assert!(ParcelId::from_parts(3, "123456", "45").is_none());
        assert!(ParcelId::from_parts(3, "block", "45").is_none());
    }

    #[test]
    fn borough_parse_is_case_insensitive() {
        assert_eq!(Borough::parse("brooklyn"), Some(Borough::Brooklyn));
        assert_eq!(Borough::parse(" Staten Island "), Some(Borough::StatenIsland));
        assert_eq!(Borough::parse("hoboken"), None);
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        assert_eq!(snippet("short", 200), "short");
        assert_eq!(snippet("αβγδε", 3), "αβγ");
    }
}
