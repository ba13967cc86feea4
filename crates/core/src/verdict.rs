//! Classification verdicts and the verdict-to-action routing table.
//!
//! The classification capability reports free-form labels such as
//! `"question / inquiry"`. Those strings survive only at the capability
//! boundary; everywhere else the pipeline works with the closed
//! [`Verdict`] enum and the explicit [`routed_actions`] table.

use serde::{Deserialize, Serialize};

/// What the classifier decided a comment is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Question,
    UrgentIssue,
    Toxic,
    CriticalFeedback,
    PartnershipProposal,
    Neutral,
    Praise,
    Spam,
    /// A label the routing table does not know. Carried verbatim so it can
    /// be persisted and inspected; routes to no actions.
    Other(String),
}

impl Verdict {
    /// Parse a capability label, case-insensitively and whitespace-tolerant.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "question / inquiry" => Verdict::Question,
            "urgent issue / complaint" => Verdict::UrgentIssue,
            "toxic / abusive" => Verdict::Toxic,
            "critical feedback" => Verdict::CriticalFeedback,
            "partnership proposal" => Verdict::PartnershipProposal,
            "neutral / other" => Verdict::Neutral,
            "praise / thanks" => Verdict::Praise,
            "spam" => Verdict::Spam,
            _ => Verdict::Other(label.trim().to_string()),
        }
    }

    /// The canonical label persisted on the classification row.
    pub fn label(&self) -> &str {
        match self {
            Verdict::Question => "question / inquiry",
            Verdict::UrgentIssue => "urgent issue / complaint",
            Verdict::Toxic => "toxic / abusive",
            Verdict::CriticalFeedback => "critical feedback",
            Verdict::PartnershipProposal => "partnership proposal",
            Verdict::Neutral => "neutral / other",
            Verdict::Praise => "praise / thanks",
            Verdict::Spam => "spam",
            Verdict::Other(label) => label,
        }
    }
}

/// Follow-up action a verdict routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutedAction {
    GenerateAnswer,
    HideComment,
    SendAlert,
}

/// The full verdict-to-action routing table.
///
/// A verdict may fan out to several actions (an urgent complaint is both
/// hidden and alerted on). Unknown labels route nowhere.
pub fn routed_actions(verdict: &Verdict) -> &'static [RoutedAction] {
    match verdict {
        Verdict::Question => &[RoutedAction::GenerateAnswer],
        Verdict::UrgentIssue => &[RoutedAction::HideComment, RoutedAction::SendAlert],
        Verdict::Toxic => &[RoutedAction::HideComment],
        Verdict::CriticalFeedback => &[RoutedAction::HideComment, RoutedAction::SendAlert],
        Verdict::PartnershipProposal => &[RoutedAction::SendAlert],
        Verdict::Neutral | Verdict::Praise | Verdict::Spam | Verdict::Other(_) => &[],
    }
}
