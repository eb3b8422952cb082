//! The digest document: new leads grouped into one section per source,
//! rendered to a single HTML email. Building the document and rendering
//! it are separate from orchestration so both can be tested directly.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use leadtrap_common::{Lead, SourceKind};

/// ACRIS document search, the manual fallback when no owner was resolved
/// for a parcel-carrying lead.
const ACRIS_URL: &str = "https://a836-acris.nyc.gov/DS/DocumentSearch/Index";

pub struct Digest {
    pub sections: Vec<Section>,
    pub generated_at: DateTime<Utc>,
}

pub struct Section {
    pub kind: SourceKind,
    pub leads: Vec<Lead>,
}

fn section_emoji(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Hpd => "🏛️",
        SourceKind::Dob => "🏗️",
        SourceKind::Ecb => "⚖️",
        SourceKind::Dohmh => "🍽️",
        SourceKind::Complaints311 => "📞",
        SourceKind::Craigslist => "📋",
        SourceKind::Reddit => "💬",
        SourceKind::Twitter => "🐦",
    }
}

impl Digest {
    /// Group leads into sections, one per non-empty source, in the fixed
    /// source order.
    pub fn build(leads: Vec<Lead>, generated_at: DateTime<Utc>) -> Digest {
        let sections = SourceKind::ALL
            .iter()
            .filter_map(|kind| {
                let matching: Vec<Lead> =
                    leads.iter().filter(|l| l.source == *kind).cloned().collect();
                if matching.is_empty() {
                    None
                } else {
                    Some(Section {
                        kind: *kind,
                        leads: matching,
                    })
                }
            })
            .collect();
        Digest {
            sections,
            generated_at,
        }
    }

    pub fn total(&self) -> usize {
        self.sections.iter().map(|s| s.leads.len()).sum()
    }

    pub fn subject(&self) -> String {
        format!("🎯 {} New Leads - NYC Pest Control", self.total())
    }

    pub fn render(&self) -> String {
        let mut html = String::new();
        html.push_str(
            "<html>\n<head>\n<style>\n\
             body { font-family: Arial, sans-serif; }\n\
             .section { margin: 20px 0; padding: 15px; border-left: 4px solid #0066ff; background: #f5f5f5; }\n\
             .lead { margin: 10px 0; padding: 10px; background: white; border-radius: 5px; }\n\
             .emergency { border-left: 4px solid #ff0000; }\n\
             .enrichment { margin-top: 10px; padding: 8px; background: #eef6ee; border-radius: 5px; }\n\
             h2 { color: #0066ff; }\n\
             .label { font-weight: bold; color: #333; }\n\
             .address { font-size: 1.1em; color: #0066ff; }\n\
             .button { background: #0066ff; color: white; padding: 8px 15px; text-decoration: none; border-radius: 5px; }\n\
             </style>\n</head>\n<body>\n",
        );
        let _ = writeln!(
            html,
            "<h1>🎯 New Pest Control Leads - {}</h1>",
            self.generated_at.format("%Y-%m-%d %H:%M")
        );

        for section in &self.sections {
            self.render_section(&mut html, section);
        }

        html.push_str(
            "<hr>\n<p style=\"color: #666; font-size: 0.9em;\">\n\
             This is an automated alert from your NYC Pest Control Lead Monitor.<br>\n\
             Respond to leads within 5 minutes for best conversion rates!\n\
             </p>\n</body>\n</html>\n",
        );
        html
    }

    fn render_section(&self, html: &mut String, section: &Section) {
        let _ = writeln!(
            html,
            "<div class=\"section\">\n<h2>{} {} ({} new)</h2>",
            section_emoji(section.kind),
            section.kind.label(),
            section.leads.len()
        );
        for lead in &section.leads {
            render_lead(html, lead);
        }
        html.push_str("</div>\n");
    }
}

fn render_lead(html: &mut String, lead: &Lead) {
    let emergency_class = if lead.emergency { " emergency" } else { "" };
    let _ = writeln!(html, "<div class=\"lead{emergency_class}\">");
    let _ = writeln!(
        html,
        "<div class=\"address\">📍 {}{}</div>",
        escape(&lead.title),
        if lead.emergency { " ⚠️ EMERGENCY" } else { "" }
    );
    if !lead.description.is_empty() {
        let _ = writeln!(
            html,
            "<div style=\"margin: 10px 0;\">{}</div>",
            escape(&lead.description)
        );
    }
    for detail in &lead.details {
        let _ = writeln!(
            html,
            "<div><span class=\"label\">{}:</span> {}</div>",
            detail.label,
            escape(&detail.value)
        );
    }

    if let Some(owner) = &lead.owner {
        html.push_str("<div class=\"enrichment\">\n");
        let _ = writeln!(
            html,
            "<div><span class=\"label\">Owner:</span> {}</div>",
            escape(&owner.name)
        );
        if let Some(address) = &owner.mailing_address {
            let _ = writeln!(
                html,
                "<div><span class=\"label\">Mailing Address:</span> {}</div>",
                escape(address)
            );
        }
        if let Some(entity) = &owner.entity {
            let _ = writeln!(
                html,
                "<div><span class=\"label\">Entity Status:</span> {}</div>",
                escape(&entity.status)
            );
            if let Some(entity_type) = &entity.entity_type {
                let _ = writeln!(
                    html,
                    "<div><span class=\"label\">Entity Type:</span> {}</div>",
                    escape(entity_type)
                );
            }
            if let Some(agent) = &entity.registered_agent {
                let _ = writeln!(
                    html,
                    "<div><span class=\"label\">Registered Agent:</span> {}</div>",
                    escape(agent)
                );
            }
            if let Some(office) = &entity.office_address {
                let _ = writeln!(
                    html,
                    "<div><span class=\"label\">Office:</span> {}</div>",
                    escape(office)
                );
            }
            let _ = writeln!(
                html,
                "<div style=\"margin-top: 6px;\"><a href=\"{}\" class=\"button\">View Registry Record →</a></div>",
                escape(&entity.lookup_url)
            );
        }
        html.push_str("</div>\n");
    } else if lead.parcel.is_some() {
        let _ = writeln!(
            html,
            "<div style=\"margin-top: 10px;\"><a href=\"{ACRIS_URL}\" class=\"button\">Find Owner in ACRIS →</a></div>"
        );
    }

    if let Some(link) = &lead.link {
        let _ = writeln!(
            html,
            "<div style=\"margin-top: 10px;\"><a href=\"{}\" class=\"button\">View Post →</a></div>",
            escape(link)
        );
    }
    html.push_str("</div>\n");
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
