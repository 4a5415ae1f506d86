//! Task type catalog
//!
//! The closed set of artifact kinds a request can be classified into, grouped by
//! the specialist domain that owns them. Every lookup table keyed by task type
//! (output format, required sources, methodology) lives here so downstream
//! consumers see one source of truth.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of artifact or request the user wants handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    // Onboarding
    KickoffPlan,
    MilestonePlan,
    StakeholderMap,
    TrainingSchedule,
    // Adoption
    UsageAnalysis,
    FeatureCampaign,
    ChampionDevelopment,
    TrainingProgram,
    // Renewal
    RenewalForecast,
    ValueSummary,
    ExpansionProposal,
    NegotiationBrief,
    // Risk
    RiskAssessment,
    SavePlay,
    EscalationReport,
    ResolutionPlan,
    // Strategic
    QbrGeneration,
    ExecutiveBriefing,
    AccountPlan,
    TransformationRoadmap,
    // Portfolio
    PortfolioDashboard,
    TeamMetrics,
    RenewalPipeline,
    AtRiskOverview,
    // General / legacy
    DataAnalysis,
    PresentationCreation,
    DocumentCreation,
    EmailDrafting,
    MeetingPrep,
    TranscriptionSummary,
    HealthAnalysis,
    ExpansionPlanning,
    // Catch-all
    Custom,
}

impl TaskType {
    /// Every task type in declaration order (the matcher iteration order)
    pub const ALL: [TaskType; 33] = [
        Self::KickoffPlan,
        Self::MilestonePlan,
        Self::StakeholderMap,
        Self::TrainingSchedule,
        Self::UsageAnalysis,
        Self::FeatureCampaign,
        Self::ChampionDevelopment,
        Self::TrainingProgram,
        Self::RenewalForecast,
        Self::ValueSummary,
        Self::ExpansionProposal,
        Self::NegotiationBrief,
        Self::RiskAssessment,
        Self::SavePlay,
        Self::EscalationReport,
        Self::ResolutionPlan,
        Self::QbrGeneration,
        Self::ExecutiveBriefing,
        Self::AccountPlan,
        Self::TransformationRoadmap,
        Self::PortfolioDashboard,
        Self::TeamMetrics,
        Self::RenewalPipeline,
        Self::AtRiskOverview,
        Self::DataAnalysis,
        Self::PresentationCreation,
        Self::DocumentCreation,
        Self::EmailDrafting,
        Self::MeetingPrep,
        Self::TranscriptionSummary,
        Self::HealthAnalysis,
        Self::ExpansionPlanning,
        Self::Custom,
    ];

    /// Wire identifier (snake_case)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KickoffPlan => "kickoff_plan",
            Self::MilestonePlan => "milestone_plan",
            Self::StakeholderMap => "stakeholder_map",
            Self::TrainingSchedule => "training_schedule",
            Self::UsageAnalysis => "usage_analysis",
            Self::FeatureCampaign => "feature_campaign",
            Self::ChampionDevelopment => "champion_development",
            Self::TrainingProgram => "training_program",
            Self::RenewalForecast => "renewal_forecast",
            Self::ValueSummary => "value_summary",
            Self::ExpansionProposal => "expansion_proposal",
            Self::NegotiationBrief => "negotiation_brief",
            Self::RiskAssessment => "risk_assessment",
            Self::SavePlay => "save_play",
            Self::EscalationReport => "escalation_report",
            Self::ResolutionPlan => "resolution_plan",
            Self::QbrGeneration => "qbr_generation",
            Self::ExecutiveBriefing => "executive_briefing",
            Self::AccountPlan => "account_plan",
            Self::TransformationRoadmap => "transformation_roadmap",
            Self::PortfolioDashboard => "portfolio_dashboard",
            Self::TeamMetrics => "team_metrics",
            Self::RenewalPipeline => "renewal_pipeline",
            Self::AtRiskOverview => "at_risk_overview",
            Self::DataAnalysis => "data_analysis",
            Self::PresentationCreation => "presentation_creation",
            Self::DocumentCreation => "document_creation",
            Self::EmailDrafting => "email_drafting",
            Self::MeetingPrep => "meeting_prep",
            Self::TranscriptionSummary => "transcription_summary",
            Self::HealthAnalysis => "health_analysis",
            Self::ExpansionPlanning => "expansion_planning",
            Self::Custom => "custom",
        }
    }

    /// Human-readable title, e.g. "Renewal Forecast"
    pub fn title(&self) -> String {
        match self {
            Self::MilestonePlan => "30-60-90 Day Plan".to_string(),
            Self::QbrGeneration => "Quarterly Business Review".to_string(),
            Self::AtRiskOverview => "At-Risk Overview".to_string(),
            _ => self
                .as_str()
                .split('_')
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                        None => String::new(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Category this task type belongs to
    pub fn category(&self) -> TaskCategory {
        match self {
            Self::KickoffPlan | Self::MilestonePlan | Self::StakeholderMap | Self::TrainingSchedule => {
                TaskCategory::Onboarding
            }
            Self::UsageAnalysis | Self::FeatureCampaign | Self::ChampionDevelopment | Self::TrainingProgram => {
                TaskCategory::Adoption
            }
            Self::RenewalForecast | Self::ValueSummary | Self::ExpansionProposal | Self::NegotiationBrief => {
                TaskCategory::Renewal
            }
            Self::RiskAssessment | Self::SavePlay | Self::EscalationReport | Self::ResolutionPlan => {
                TaskCategory::Risk
            }
            Self::QbrGeneration | Self::ExecutiveBriefing | Self::AccountPlan | Self::TransformationRoadmap => {
                TaskCategory::Strategic
            }
            Self::PortfolioDashboard | Self::TeamMetrics | Self::RenewalPipeline | Self::AtRiskOverview => {
                TaskCategory::Portfolio
            }
            Self::DataAnalysis
            | Self::PresentationCreation
            | Self::DocumentCreation
            | Self::EmailDrafting
            | Self::MeetingPrep
            | Self::TranscriptionSummary
            | Self::HealthAnalysis
            | Self::ExpansionPlanning => TaskCategory::General,
            Self::Custom => TaskCategory::Custom,
        }
    }

    /// One-line description used in the oracle prompt
    pub fn description(&self) -> &'static str {
        match self {
            Self::KickoffPlan => "Kickoff meeting plan or deck for a newly signed customer",
            Self::MilestonePlan => "30-60-90 day onboarding plan with milestones",
            Self::StakeholderMap => "Map of customer stakeholders, roles and influence",
            Self::TrainingSchedule => "Calendar of onboarding training sessions",
            Self::UsageAnalysis => "Analysis of product usage and adoption metrics",
            Self::FeatureCampaign => "Campaign to drive adoption of specific features",
            Self::ChampionDevelopment => "Plan to identify and grow customer champions",
            Self::TrainingProgram => "Structured enablement or training curriculum",
            Self::RenewalForecast => "Forecast of renewal likelihood and outcome",
            Self::ValueSummary => "Summary of value and ROI delivered to the customer",
            Self::ExpansionProposal => "Upsell or expansion proposal for the customer",
            Self::NegotiationBrief => "Brief to prepare for a renewal or pricing negotiation",
            Self::RiskAssessment => "Assessment of churn risk and its drivers",
            Self::SavePlay => "Save play to retain an at-risk customer",
            Self::EscalationReport => "Report documenting an active escalation",
            Self::ResolutionPlan => "Plan to resolve open issues or tickets",
            Self::QbrGeneration => "Quarterly business review deck",
            Self::ExecutiveBriefing => "Briefing for executives about an account",
            Self::AccountPlan => "Strategic account or success plan",
            Self::TransformationRoadmap => "Multi-phase transformation roadmap",
            Self::PortfolioDashboard => "Overview of the health of a whole book of business",
            Self::TeamMetrics => "Performance metrics for the customer success team",
            Self::RenewalPipeline => "Pipeline of upcoming renewals across accounts",
            Self::AtRiskOverview => "List of at-risk accounts across the portfolio",
            Self::DataAnalysis => "General analysis of customer data",
            Self::PresentationCreation => "General slide deck or presentation",
            Self::DocumentCreation => "General document or report",
            Self::EmailDrafting => "Draft an email to a customer contact",
            Self::MeetingPrep => "Preparation notes for an upcoming meeting or call",
            Self::TranscriptionSummary => "Summary of a call or meeting transcript",
            Self::HealthAnalysis => "Explanation of a customer's health score",
            Self::ExpansionPlanning => "Identify expansion and cross-sell opportunities",
            Self::Custom => "Anything that does not fit the types above",
        }
    }

    /// Output format the plan for this task type produces
    pub fn output_format(&self) -> OutputFormat {
        match self {
            Self::KickoffPlan
            | Self::ValueSummary
            | Self::ExpansionProposal
            | Self::QbrGeneration
            | Self::ExecutiveBriefing
            | Self::TransformationRoadmap
            | Self::PresentationCreation => OutputFormat::Slides,
            Self::MilestonePlan
            | Self::FeatureCampaign
            | Self::ChampionDevelopment
            | Self::TrainingProgram
            | Self::RenewalForecast
            | Self::NegotiationBrief
            | Self::RiskAssessment
            | Self::SavePlay
            | Self::EscalationReport
            | Self::ResolutionPlan
            | Self::AccountPlan
            | Self::DocumentCreation
            | Self::ExpansionPlanning => OutputFormat::Docs,
            Self::StakeholderMap
            | Self::TrainingSchedule
            | Self::UsageAnalysis
            | Self::PortfolioDashboard
            | Self::TeamMetrics
            | Self::RenewalPipeline
            | Self::DataAnalysis => OutputFormat::Sheet,
            Self::EmailDrafting => OutputFormat::Email,
            Self::AtRiskOverview
            | Self::MeetingPrep
            | Self::TranscriptionSummary
            | Self::HealthAnalysis
            | Self::Custom => OutputFormat::Chat,
        }
    }

    /// Data sources the context provider must assemble for this task type
    pub fn required_sources(&self) -> &'static [&'static str] {
        match self {
            Self::KickoffPlan => &["customer_360", "stakeholders", "contract_terms", "knowledge_base"],
            Self::MilestonePlan => &["customer_360", "contract_terms", "stakeholders", "knowledge_base"],
            Self::StakeholderMap => &["stakeholders", "customer_360", "meeting_history"],
            Self::TrainingSchedule => &["stakeholders", "usage_data", "knowledge_base"],
            Self::UsageAnalysis => &["usage_data", "engagement_metrics", "customer_360"],
            Self::FeatureCampaign => &["usage_data", "engagement_metrics", "knowledge_base"],
            Self::ChampionDevelopment => &["stakeholders", "engagement_metrics", "meeting_history"],
            Self::TrainingProgram => &["usage_data", "stakeholders", "knowledge_base"],
            Self::RenewalForecast => &[
                "customer_360",
                "health_trends",
                "renewal_forecast",
                "engagement_metrics",
                "contract_terms",
            ],
            Self::ValueSummary => &["customer_360", "usage_data", "health_trends", "previous_artifacts"],
            Self::ExpansionProposal => &["customer_360", "usage_data", "contract_terms", "knowledge_base"],
            Self::NegotiationBrief => &["contract_terms", "renewal_forecast", "customer_360", "risk_signals"],
            Self::RiskAssessment => &["risk_signals", "health_trends", "customer_360", "support_tickets"],
            Self::SavePlay => &["risk_signals", "customer_360", "knowledge_base", "stakeholders"],
            Self::EscalationReport => &["support_tickets", "risk_signals", "email_threads", "customer_360"],
            Self::ResolutionPlan => &["support_tickets", "risk_signals", "knowledge_base"],
            Self::QbrGeneration => &[
                "customer_360",
                "health_trends",
                "usage_data",
                "engagement_metrics",
                "previous_artifacts",
            ],
            Self::ExecutiveBriefing => &["customer_360", "health_trends", "risk_signals", "stakeholders"],
            Self::AccountPlan => &["customer_360", "stakeholders", "contract_terms", "knowledge_base"],
            Self::TransformationRoadmap => &["customer_360", "usage_data", "stakeholders", "knowledge_base"],
            Self::PortfolioDashboard => &["portfolio_data", "health_trends", "renewal_forecast"],
            Self::TeamMetrics => &["team_metrics", "portfolio_data"],
            Self::RenewalPipeline => &["portfolio_data", "renewal_forecast", "contract_terms"],
            Self::AtRiskOverview => &["portfolio_data", "risk_signals", "health_trends"],
            Self::DataAnalysis => &["customer_360", "usage_data", "engagement_metrics"],
            Self::PresentationCreation => &["customer_360", "knowledge_base", "previous_artifacts"],
            Self::DocumentCreation => &["customer_360", "knowledge_base"],
            Self::EmailDrafting => &["customer_360", "email_threads", "stakeholders"],
            Self::MeetingPrep => &["customer_360", "meeting_history", "email_threads", "risk_signals"],
            Self::TranscriptionSummary => &["transcripts", "meeting_history"],
            Self::HealthAnalysis => &["customer_360", "health_trends", "risk_signals", "engagement_metrics"],
            Self::ExpansionPlanning => &["customer_360", "usage_data", "contract_terms"],
            Self::Custom => &["knowledge_base", "customer_360"],
        }
    }

    /// Name of the methodology suggested for this task type, if any
    ///
    /// Specialist and portfolio types carry `<type>_methodology`; general types
    /// and `custom` have none.
    pub fn suggested_methodology(&self) -> Option<String> {
        match self.category() {
            TaskCategory::General | TaskCategory::Custom => None,
            _ => Some(format!("{}_methodology", self.as_str())),
        }
    }

    /// Whether this is the catch-all type
    pub fn is_custom(&self) -> bool {
        *self == Self::Custom
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = UnknownTaskType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == needle)
            .ok_or(UnknownTaskType(needle))
    }
}

/// Returned when a string is not a known task type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown task type: '{0}'")]
pub struct UnknownTaskType(pub String);

/// Grouping of task types for prompts and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Onboarding,
    Adoption,
    Renewal,
    Risk,
    Strategic,
    Portfolio,
    General,
    Custom,
}

impl TaskCategory {
    /// Categories in catalog order
    pub const ALL: [TaskCategory; 8] = [
        Self::Onboarding,
        Self::Adoption,
        Self::Renewal,
        Self::Risk,
        Self::Strategic,
        Self::Portfolio,
        Self::General,
        Self::Custom,
    ];

    /// Display heading
    pub fn label(&self) -> &'static str {
        match self {
            Self::Onboarding => "Onboarding specialist",
            Self::Adoption => "Adoption specialist",
            Self::Renewal => "Renewal specialist",
            Self::Risk => "Risk specialist",
            Self::Strategic => "Strategic specialist",
            Self::Portfolio => "Portfolio (general)",
            Self::General => "General",
            Self::Custom => "Fallback",
        }
    }

    /// Task types in this category, in declaration order
    pub fn task_types(&self) -> Vec<TaskType> {
        TaskType::ALL.iter().copied().filter(|t| t.category() == *self).collect()
    }
}

/// Active specialist hint supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialist {
    Onboarding,
    Adoption,
    Renewal,
    Risk,
    Strategic,
}

impl Specialist {
    /// Task types this specialist owns
    pub fn task_types(&self) -> &'static [TaskType] {
        match self {
            Self::Onboarding => &[
                TaskType::KickoffPlan,
                TaskType::MilestonePlan,
                TaskType::StakeholderMap,
                TaskType::TrainingSchedule,
            ],
            Self::Adoption => &[
                TaskType::UsageAnalysis,
                TaskType::FeatureCampaign,
                TaskType::ChampionDevelopment,
                TaskType::TrainingProgram,
            ],
            Self::Renewal => &[
                TaskType::RenewalForecast,
                TaskType::ValueSummary,
                TaskType::ExpansionProposal,
                TaskType::NegotiationBrief,
                TaskType::ExpansionPlanning,
            ],
            Self::Risk => &[
                TaskType::RiskAssessment,
                TaskType::SavePlay,
                TaskType::EscalationReport,
                TaskType::ResolutionPlan,
                TaskType::HealthAnalysis,
            ],
            Self::Strategic => &[
                TaskType::QbrGeneration,
                TaskType::ExecutiveBriefing,
                TaskType::AccountPlan,
                TaskType::TransformationRoadmap,
            ],
        }
    }
}

impl std::fmt::Display for Specialist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Onboarding => write!(f, "onboarding"),
            Self::Adoption => write!(f, "adoption"),
            Self::Renewal => write!(f, "renewal"),
            Self::Risk => write!(f, "risk"),
            Self::Strategic => write!(f, "strategic"),
        }
    }
}

impl FromStr for Specialist {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "onboarding" => Ok(Self::Onboarding),
            "adoption" => Ok(Self::Adoption),
            "renewal" => Ok(Self::Renewal),
            "risk" => Ok(Self::Risk),
            "strategic" => Ok(Self::Strategic),
            other => Err(format!(
                "Unknown specialist '{}'. Expected one of: onboarding, adoption, renewal, risk, strategic",
                other
            )),
        }
    }
}

/// Where and how a plan's result is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Slides,
    Docs,
    Email,
    Sheet,
    Chat,
}

impl OutputFormat {
    /// True when delivering this format creates something outside the chat
    pub fn creates_artifact(&self) -> bool {
        !matches!(self, Self::Chat)
    }

    /// Artifact kind label used when matching prior artifacts
    pub fn artifact_kind(&self) -> &'static str {
        match self {
            Self::Slides => "presentation",
            Self::Docs => "document",
            Self::Email => "email",
            Self::Sheet => "spreadsheet",
            Self::Chat => "chat",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slides => write!(f, "slides"),
            Self::Docs => write!(f, "docs"),
            Self::Email => write!(f, "email"),
            Self::Sheet => write!(f, "sheet"),
            Self::Chat => write!(f, "chat"),
        }
    }
}
