//! Aggregated business context
//!
//! Assembled by an external context provider and consumed read-only by the
//! planner. Every fragment is optional: a provider that knows nothing about an
//! entity returns `AggregatedContext::default()`.

use serde::{Deserialize, Serialize};

/// Everything the planner may know about the entity a request concerns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatedContext {
    /// Knowledge-base hits (playbooks, templates, articles)
    pub knowledge: Vec<KnowledgeHit>,

    /// Customer snapshot
    pub customer: Option<CustomerSnapshot>,

    /// Health score history, oldest first
    #[serde(rename = "health-trend")]
    pub health_trend: Vec<HealthPoint>,

    /// Active risk signals
    #[serde(rename = "risk-signals")]
    pub risk_signals: Vec<RiskSignal>,

    /// Renewal forecast
    #[serde(rename = "renewal-forecast")]
    pub renewal_forecast: Option<RenewalForecast>,

    /// Artifacts previously produced for this entity
    #[serde(rename = "prior-artifacts")]
    pub prior_artifacts: Vec<ArtifactRef>,

    /// Recent communication threads
    #[serde(rename = "communication-threads")]
    pub communication_threads: Vec<ThreadRef>,
}

impl AggregatedContext {
    /// Customer display name, if known
    pub fn customer_name(&self) -> Option<&str> {
        self.customer.as_ref().map(|c| c.name.as_str()).filter(|n| !n.trim().is_empty())
    }

    /// Short plain-text summary used in prompts
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(customer) = &self.customer {
            let mut line = format!("Customer: {}", customer.name);
            if let Some(score) = customer.health_score {
                line.push_str(&format!(", health {}/100", score));
            }
            if let Some(status) = &customer.status {
                line.push_str(&format!(", status {}", status));
            }
            parts.push(line);
        }
        if let Some(direction) = trend_direction(&self.health_trend) {
            parts.push(format!("Health trend: {}", direction));
        }
        if !self.risk_signals.is_empty() {
            parts.push(format!("{} active risk signals", self.risk_signals.len()));
        }
        if let Some(forecast) = &self.renewal_forecast {
            parts.push(format!("Renewal probability {}%", percent(forecast.probability)));
        }
        if parts.is_empty() {
            "No customer context available".to_string()
        } else {
            parts.join("; ")
        }
    }
}

/// Kind of knowledge-base entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeKind {
    Playbook,
    Template,
    #[default]
    Article,
}

/// One knowledge-base hit with its relevance score in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeHit {
    pub title: String,
    #[serde(default)]
    pub kind: KnowledgeKind,
    pub relevance: f64,
}

/// Point-in-time view of a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, rename = "health-score")]
    pub health_score: Option<u8>,
    #[serde(default)]
    pub arr: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// One health score observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthPoint {
    pub date: String,
    pub score: f64,
}

/// Severity of a risk signal, ordered low to critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSignal {
    #[serde(default)]
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenewalForecast {
    /// Probability of renewal in [0, 1]
    pub probability: f64,
    #[serde(default, rename = "predicted-outcome")]
    pub predicted_outcome: Option<String>,
    #[serde(default, rename = "renewal-date")]
    pub renewal_date: Option<String>,
}

/// Reference to a previously generated artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub title: String,
    /// e.g. "presentation", "document", "spreadsheet", "email"
    pub kind: String,
    #[serde(default, rename = "created-at")]
    pub created_at: Option<String>,
}

/// Reference to a communication thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadRef {
    pub subject: String,
    #[serde(default, rename = "last-activity")]
    pub last_activity: Option<String>,
}

/// Direction of a health trend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Improving => write!(f, "improving"),
            Self::Declining => write!(f, "declining"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

/// Compare the first and last points; `None` when there is no history
pub fn trend_direction(points: &[HealthPoint]) -> Option<TrendDirection> {
    let first = points.first()?;
    let last = points.last()?;
    Some(if last.score > first.score {
        TrendDirection::Improving
    } else if last.score < first.score {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    })
}

/// Fraction in [0, 1] as a rounded whole percentage
pub fn percent(fraction: f64) -> i64 {
    (fraction * 100.0).round() as i64
}
