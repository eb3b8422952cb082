use std::collections::HashMap;

use leadtrap_common::SourceKind;

/// Stats from a monitor run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub candidates: u32,
    pub duplicates: u32,
    pub new_by_source: HashMap<SourceKind, u32>,
    pub failed_partitions: u32,
    pub owners_resolved: u32,
    pub entities_matched: u32,
    pub delivered: bool,
}

impl RunStats {
    pub fn new_leads(&self) -> u32 {
        self.new_by_source.values().sum()
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Monitor Run Complete ===")?;
        writeln!(f, "Candidates seen:    {}", self.candidates)?;
        writeln!(f, "Duplicates skipped: {}", self.duplicates)?;
        writeln!(f, "New leads:          {}", self.new_leads())?;
        writeln!(f, "Failed partitions:  {}", self.failed_partitions)?;
        writeln!(f, "Owners resolved:    {}", self.owners_resolved)?;
        writeln!(f, "Entities matched:   {}", self.entities_matched)?;
        writeln!(f, "Delivered:          {}", self.delivered)?;
        writeln!(f, "\nBy source:")?;
        for kind in SourceKind::ALL {
            writeln!(
                f,
                "  {:<11} {}",
                format!("{kind}:"),
                self.new_by_source.get(&kind).copied().unwrap_or(0)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_across_sources() {
        let mut stats = RunStats::default();
        stats.new_by_source.insert(SourceKind::Hpd, 3);
        stats.new_by_source.insert(SourceKind::Reddit, 2);
        assert_eq!(stats.new_leads(), 5);

        let rendered = stats.to_string();
        assert!(rendered.contains("New leads:          5"));
        assert!(rendered.contains("hpd:"));
    }
}
