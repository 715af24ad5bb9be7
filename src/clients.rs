//! Mock client accounts and internal projects.
//!
//! Everything here is static demo data. Health scores are fixed in the
//! 0–100 range and never recomputed.

use serde::Serialize;

/// A client account or internal project card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub id: &'static str,
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<&'static str>,
    /// Relationship health, 0–100.
    pub health_score: u8,
    /// Emails, calls and meetings captured.
    pub data_points: u32,
}

/// Coarse health bucket used for labels and colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthBand {
    Healthy,
    Moderate,
    Low,
}

impl HealthBand {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            70.. => Self::Healthy,
            40.. => Self::Moderate,
            _ => Self::Low,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
        }
    }

    /// CSS class for the health bar fill.
    #[must_use]
    pub fn bar_class(self) -> &'static str {
        match self {
            Self::Healthy => "bg-green-500",
            Self::Moderate => "bg-yellow-500",
            Self::Low => "bg-red-500",
        }
    }

    /// CSS class for the headline score text.
    #[must_use]
    pub fn text_class(self) -> &'static str {
        match self {
            Self::Healthy => "text-green-500",
            Self::Moderate => "text-yellow-500",
            Self::Low => "text-red-500",
        }
    }
}

impl ClientRecord {
    #[must_use]
    pub fn health(&self) -> HealthBand {
        HealthBand::from_score(self.health_score)
    }
}

const fn record(
    id: &'static str,
    name: &'static str,
    logo: Option<&'static str>,
    health_score: u8,
    data_points: u32,
) -> ClientRecord {
    ClientRecord {
        id,
        name,
        logo,
        health_score,
        data_points,
    }
}

/// External client accounts shown on the landing page.
pub const CLIENTS: &[ClientRecord] = &[
    record("tacto", "Tacto", Some("/static/images/tacto.png"), 85, 1247),
    record("google", "Google", Some("/static/images/google.png"), 92, 3891),
    record("x", "X (Twitter)", Some("/static/images/x.png"), 68, 892),
    record("meta", "Meta", Some("/static/images/meta.png"), 76, 2156),
];

/// Internal projects shown below the client list.
pub const INTERNAL_PROJECTS: &[ClientRecord] = &[
    record("product-dev", "Product Development", None, 88, 2341),
    record("marketing", "Marketing Team", None, 72, 1567),
    record("sales", "Sales Operations", None, 81, 1823),
];

/// Accounts reachable by id only.
pub const EXTRA_ACCOUNTS: &[ClientRecord] = &[
    record("techparts", "TechParts GmbH", Some("/static/logos/techparts.png"), 72, 972),
    record("altus", "Altus Components", Some("/static/logos/altus.png"), 64, 563),
];

/// Find a record by id, ignoring ASCII case.
#[must_use]
pub fn find(id: &str) -> Option<&'static ClientRecord> {
    CLIENTS
        .iter()
        .chain(INTERNAL_PROJECTS)
        .chain(EXTRA_ACCOUNTS)
        .find(|c| c.id.eq_ignore_ascii_case(id))
}

/// A recent activity item on an account page.
#[derive(Debug, Clone, Copy)]
pub struct ActivityItem {
    pub text: &'static str,
    pub source: &'static str,
    pub ago: &'static str,
    pub accent: &'static str,
}

/// Recent activity shown on every account page.
pub const RECENT_ACTIVITY: &[ActivityItem] = &[
    ActivityItem {
        text: "Alex unhappy with price change",
        source: "Outlook",
        ago: "47 minutes ago",
        accent: "text-blue-400",
    },
    ActivityItem {
        text: "Andre going on vacation until 22nd of November",
        source: "Teams meeting transcription",
        ago: "3 days ago",
        accent: "text-purple-400",
    },
    ActivityItem {
        text: "PO-442 delay triggered escalation to Martin",
        source: "Call notes",
        ago: "6 days ago",
        accent: "text-green-400",
    },
];

/// Canned account briefing.
pub const BRIEFING: &[&str] = &[
    "Health: Yellow · Recoverable but fragile",
    "Q4 at risk: ~€420K",
    "Last escalation: PO-442 late twice → €7.2K credit",
    "How to talk to Martin: status first, apology last, call 16:30–18:00 CET",
];

/// Canned highlight reel.
pub const REEL: &[&str] = &[
    "Q4 renewal at risk ~€420K",
    r#"Threat: "We'll move half to Altus in Jan""#,
    "Thursday dispatch promise is critical",
    r#"Never say "logistics backlog""#,
    "Call 16:30–18:00 CET",
];
