//! Default section templates
//!
//! Hand-authored section lists per task type, used whenever no methodology
//! override is supplied. Downstream consumers key off these exact names and
//! data source strings.

use crate::domain::{OutputFormat, PlanSection, TaskType};

/// `(name, description, data sources)`
pub type SectionTemplate = (&'static str, &'static str, &'static [&'static str]);

/// Default sections for a task type, 3 to 7 per type
pub fn default_sections(task_type: TaskType) -> &'static [SectionTemplate] {
    match task_type {
        TaskType::KickoffPlan => &[
            ("Welcome & Introductions", "Team introductions and roles on both sides", &["stakeholders"]),
            (
                "Goals & Success Criteria",
                "What the customer wants to achieve and how success is measured",
                &["customer_360", "contract_terms"],
            ),
            ("Implementation Timeline", "Phases, key dates and dependencies", &["contract_terms", "knowledge_base"]),
            ("Roles & Responsibilities", "Owners for each workstream", &["stakeholders"]),
            ("Next Steps", "Immediate actions and the next meeting", &["knowledge_base"]),
        ],
        TaskType::MilestonePlan => &[
            ("First 30 Days", "Setup, integrations and first value", &["contract_terms", "knowledge_base"]),
            ("Days 31-60", "Rollout to core users and early adoption", &["customer_360", "knowledge_base"]),
            ("Days 61-90", "Expansion to secondary teams and first review", &["customer_360", "stakeholders"]),
            ("Success Metrics", "Measurable outcomes per milestone", &["customer_360", "contract_terms"]),
            ("Risks & Dependencies", "What could delay the plan", &["stakeholders"]),
        ],
        TaskType::StakeholderMap => &[
            ("Stakeholder Directory", "Names, titles and departments", &["stakeholders"]),
            (
                "Influence & Sentiment",
                "Decision power and current sentiment per stakeholder",
                &["stakeholders", "meeting_history"],
            ),
            ("Engagement History", "Recent touchpoints per stakeholder", &["meeting_history"]),
            ("Coverage Gaps", "Roles without a relationship owner", &["stakeholders", "customer_360"]),
        ],
        TaskType::TrainingSchedule => &[
            ("Audience Groups", "Who needs training, grouped by role", &["stakeholders"]),
            ("Session Calendar", "Dates, formats and facilitators", &["stakeholders", "knowledge_base"]),
            ("Curriculum per Session", "Topics covered in each session", &["knowledge_base"]),
            ("Completion Tracking", "Attendance and follow-up measurement", &["usage_data"]),
        ],
        TaskType::UsageAnalysis => &[
            ("Usage Overview", "Active users, sessions and licence utilisation", &["usage_data"]),
            ("Feature Adoption", "Adoption by feature and team", &["usage_data", "engagement_metrics"]),
            ("Trends", "Period-over-period changes", &["usage_data"]),
            ("Engagement by Segment", "Differences between user groups", &["engagement_metrics", "customer_360"]),
            ("Recommendations", "Where to focus adoption work", &["usage_data"]),
        ],
        TaskType::FeatureCampaign => &[
            ("Campaign Objective", "Target feature and the adoption goal", &["usage_data"]),
            ("Target Audience", "Users who would benefit most", &["usage_data", "engagement_metrics"]),
            ("Messaging & Channels", "What to say and where", &["knowledge_base"]),
            ("Timeline", "Campaign phases and touchpoints", &["knowledge_base"]),
            ("Success Metrics", "How adoption lift is measured", &["usage_data", "engagement_metrics"]),
        ],
        TaskType::ChampionDevelopment => &[
            ("Current Champions", "Existing advocates and their reach", &["stakeholders", "engagement_metrics"]),
            ("Candidate Champions", "Engaged users ready for more", &["engagement_metrics", "meeting_history"]),
            ("Development Activities", "Enablement, recognition and access", &["stakeholders"]),
            ("Engagement Cadence", "How often and how to stay in touch", &["meeting_history"]),
        ],
        TaskType::TrainingProgram => &[
            ("Program Goals", "Skills and outcomes the program targets", &["usage_data"]),
            ("Learning Paths", "Role-based tracks", &["stakeholders", "knowledge_base"]),
            ("Curriculum", "Modules and materials", &["knowledge_base"]),
            ("Delivery Plan", "Formats, cadence and owners", &["stakeholders"]),
            ("Measurement", "Certification and usage impact", &["usage_data"]),
        ],
        TaskType::RenewalForecast => &[
            ("Renewal Summary", "Contract value, dates and terms", &["contract_terms", "customer_360"]),
            ("Health & Engagement", "Health trend and engagement signals", &["health_trends", "engagement_metrics"]),
            ("Forecast", "Renewal likelihood and predicted outcome", &["renewal_forecast"]),
            ("Risks to Renewal", "Signals that could block the renewal", &["renewal_forecast", "health_trends"]),
            ("Recommended Actions", "Steps to secure the renewal", &["customer_360"]),
        ],
        TaskType::ValueSummary => &[
            ("Executive Summary", "Headline value delivered", &["customer_360"]),
            ("Goals vs Outcomes", "Original objectives and results", &["customer_360", "previous_artifacts"]),
            ("Usage Highlights", "Adoption milestones", &["usage_data"]),
            ("ROI", "Quantified business impact", &["usage_data", "customer_360"]),
            ("Health Trajectory", "Health over the contract term", &["health_trends"]),
            ("Looking Ahead", "Next value opportunities", &["customer_360"]),
        ],
        TaskType::ExpansionProposal => &[
            ("Current Footprint", "Licences, products and usage", &["customer_360", "usage_data"]),
            ("Business Case", "Value of expanding", &["usage_data", "knowledge_base"]),
            ("Proposed Expansion", "Products, seats and teams", &["contract_terms"]),
            ("Pricing & Terms", "Commercial proposal", &["contract_terms"]),
            ("Implementation Plan", "How the expansion rolls out", &["knowledge_base"]),
        ],
        TaskType::NegotiationBrief => &[
            ("Contract Position", "Current terms and renewal date", &["contract_terms"]),
            ("Leverage & Risks", "What strengthens or weakens our position", &["risk_signals", "renewal_forecast"]),
            ("Customer Priorities", "What the customer cares about most", &["customer_360"]),
            (
                "Negotiation Strategy",
                "Opening position, concessions and walk-away",
                &["contract_terms", "renewal_forecast"],
            ),
        ],
        TaskType::RiskAssessment => &[
            ("Risk Summary", "Overall risk level and drivers", &["risk_signals", "customer_360"]),
            ("Health Trend", "Health score movement", &["health_trends"]),
            ("Risk Signals", "Active signals by severity", &["risk_signals"]),
            ("Support Issues", "Open and recent tickets", &["support_tickets"]),
            ("Mitigation Plan", "Actions to reduce risk", &["risk_signals"]),
        ],
        TaskType::SavePlay => &[
            ("Situation", "What is putting the account at risk", &["risk_signals", "customer_360"]),
            ("Stakeholder Plan", "Who to engage and how", &["stakeholders"]),
            ("Save Actions", "Concrete interventions with owners", &["knowledge_base"]),
            ("Timeline", "Sequence and deadlines", &["customer_360"]),
            ("Success Criteria", "How we know the account is saved", &["risk_signals"]),
        ],
        TaskType::EscalationReport => &[
            ("Issue Summary", "What happened and its impact", &["support_tickets", "customer_360"]),
            ("Timeline of Events", "Key events and communications", &["support_tickets", "email_threads"]),
            ("Business Impact", "Effect on the customer relationship", &["risk_signals", "customer_360"]),
            ("Actions Taken", "Steps so far", &["support_tickets"]),
            ("Requested Support", "What we need from whom", &["risk_signals"]),
        ],
        TaskType::ResolutionPlan => &[
            ("Problem Statement", "Root issue and affected areas", &["support_tickets"]),
            ("Root Cause", "Why it happened", &["support_tickets", "risk_signals"]),
            ("Resolution Steps", "Fix plan with owners and dates", &["knowledge_base"]),
            ("Communication Plan", "How progress is shared with the customer", &["knowledge_base"]),
            ("Prevention", "Changes that stop a recurrence", &["risk_signals"]),
        ],
        TaskType::QbrGeneration => &[
            ("Executive Summary", "Quarter highlights", &["customer_360"]),
            ("Health & Engagement", "Health score and engagement trends", &["health_trends", "engagement_metrics"]),
            ("Usage & Adoption", "Product usage over the quarter", &["usage_data"]),
            ("Value Delivered", "Outcomes against goals", &["customer_360", "previous_artifacts"]),
            ("Risks & Opportunities", "What to watch and where to grow", &["health_trends", "customer_360"]),
            ("Next Quarter Priorities", "Agreed goals for next quarter", &["customer_360"]),
        ],
        TaskType::ExecutiveBriefing => &[
            ("Account Snapshot", "Key facts at a glance", &["customer_360"]),
            ("Health & Risks", "Health trend and active risks", &["health_trends", "risk_signals"]),
            ("Key Stakeholders", "Executive relationships", &["stakeholders"]),
            ("Talking Points", "Messages for the executive conversation", &["customer_360"]),
        ],
        TaskType::AccountPlan => &[
            ("Account Overview", "Company, footprint and contract", &["customer_360", "contract_terms"]),
            ("Strategic Objectives", "Customer goals for the year", &["customer_360"]),
            ("Relationship Map", "Stakeholders and coverage", &["stakeholders"]),
            ("Growth Opportunities", "Expansion and cross-sell", &["contract_terms", "knowledge_base"]),
            ("Risks", "Threats to the account", &["customer_360"]),
            ("Action Plan", "Initiatives, owners and dates", &["knowledge_base"]),
        ],
        TaskType::TransformationRoadmap => &[
            ("Vision", "Where the customer wants to be", &["customer_360"]),
            ("Current State", "Today's usage and maturity", &["usage_data", "customer_360"]),
            ("Roadmap Phases", "Multi-phase plan with outcomes", &["knowledge_base"]),
            ("Stakeholder Alignment", "Sponsors and owners per phase", &["stakeholders"]),
            ("Milestones & KPIs", "Measurable checkpoints", &["usage_data"]),
        ],
        TaskType::PortfolioDashboard => &[
            ("Portfolio Summary", "Accounts, ARR and health distribution", &["portfolio_data"]),
            ("Health Distribution", "Accounts by health band and trend", &["health_trends", "portfolio_data"]),
            ("Upcoming Renewals", "Renewals in the next two quarters", &["renewal_forecast"]),
            ("Accounts Needing Attention", "Largest negative movements", &["health_trends"]),
        ],
        TaskType::TeamMetrics => &[
            ("Team Overview", "Headcount and book size per CSM", &["team_metrics"]),
            ("Performance Metrics", "Retention, expansion and activity", &["team_metrics", "portfolio_data"]),
            ("Workload", "Accounts and touchpoints per CSM", &["team_metrics"]),
        ],
        TaskType::RenewalPipeline => &[
            ("Pipeline Summary", "Renewals by quarter and value", &["portfolio_data", "renewal_forecast"]),
            ("Renewals by Stage", "Status of each renewal", &["renewal_forecast"]),
            ("At-Risk Renewals", "Renewals below forecast threshold", &["renewal_forecast", "portfolio_data"]),
            ("Contract Details", "Dates, terms and owners", &["contract_terms"]),
        ],
        TaskType::AtRiskOverview => &[
            ("At-Risk Accounts", "Accounts ranked by risk", &["portfolio_data", "risk_signals"]),
            ("Common Risk Drivers", "Signals shared across accounts", &["risk_signals"]),
            ("Health Movement", "Recent health declines", &["health_trends"]),
            ("Suggested Interventions", "Where to act first", &["risk_signals"]),
        ],
        TaskType::DataAnalysis => &[
            ("Data Summary", "Sources and scope", &["customer_360"]),
            ("Key Metrics", "Headline numbers", &["usage_data", "engagement_metrics"]),
            ("Breakdown", "Metrics by segment", &["usage_data"]),
            ("Findings", "Notable patterns", &["engagement_metrics"]),
        ],
        TaskType::PresentationCreation => &[
            ("Title & Agenda", "Purpose and flow of the deck", &["customer_360"]),
            ("Context", "Background for the audience", &["customer_360", "knowledge_base"]),
            ("Main Content", "Core message and supporting points", &["knowledge_base", "previous_artifacts"]),
            ("Next Steps", "Asks and follow-ups", &["customer_360"]),
        ],
        TaskType::DocumentCreation => &[
            ("Introduction", "Purpose and audience", &["customer_360"]),
            ("Body", "Main content", &["knowledge_base"]),
            ("Conclusion", "Summary and next steps", &["customer_360"]),
        ],
        TaskType::EmailDrafting => &[
            ("Subject Line", "Short and specific", &["email_threads"]),
            ("Opening", "Greeting and context", &["stakeholders", "email_threads"]),
            ("Body", "Main message", &["customer_360"]),
            ("Call to Action", "What the recipient should do", &["customer_360"]),
        ],
        TaskType::MeetingPrep => &[
            ("Meeting Objective", "What the meeting must achieve", &["meeting_history"]),
            ("Attendee Background", "Who is attending and their concerns", &["customer_360", "email_threads"]),
            ("Open Issues", "Risks and unresolved threads", &["risk_signals", "email_threads"]),
            ("Talking Points", "Key messages and questions", &["meeting_history", "customer_360"]),
        ],
        TaskType::TranscriptionSummary => &[
            ("Summary", "What the conversation covered", &["transcripts"]),
            ("Key Decisions", "Agreements reached", &["transcripts"]),
            ("Action Items", "Owners and due dates", &["transcripts", "meeting_history"]),
        ],
        TaskType::HealthAnalysis => &[
            ("Health Score", "Current score and components", &["customer_360"]),
            ("Trend", "Movement over time", &["health_trends"]),
            ("Contributing Factors", "Engagement and risk drivers", &["engagement_metrics", "risk_signals"]),
            ("Recommendations", "How to improve health", &["customer_360"]),
        ],
        TaskType::ExpansionPlanning => &[
            ("Current Footprint", "What the customer owns today", &["customer_360", "contract_terms"]),
            ("Whitespace Analysis", "Teams and products not yet covered", &["usage_data", "customer_360"]),
            ("Expansion Opportunities", "Ranked opportunities with value", &["usage_data"]),
            ("Approach", "Plays and timing", &["contract_terms"]),
        ],
        TaskType::Custom => &[
            ("Overview", "Restate the request and its context", &["customer_360"]),
            ("Analysis", "Relevant information and findings", &["knowledge_base", "customer_360"]),
            ("Recommendations", "Suggested next steps", &["knowledge_base"]),
        ],
    }
}

/// Default sections as owned plan sections
pub fn default_plan_sections(task_type: TaskType) -> Vec<PlanSection> {
    default_sections(task_type)
        .iter()
        .map(|(name, description, sources)| PlanSection::new(*name, *description, sources))
        .collect()
}

/// Word range for text outputs
fn word_range(task_type: TaskType) -> &'static str {
    match task_type {
        TaskType::EmailDrafting => "150-300 words",
        TaskType::MeetingPrep | TaskType::TranscriptionSummary => "300-600 words",
        TaskType::AtRiskOverview | TaskType::HealthAnalysis => "400-800 words",
        TaskType::Custom => "200-500 words",
        TaskType::MilestonePlan | TaskType::RenewalForecast | TaskType::NegotiationBrief => "1,000-1,500 words",
        TaskType::AccountPlan | TaskType::ExpansionPlanning => "1,500-2,500 words",
        _ => "800-1,500 words",
    }
}

/// Size estimate for a plan with `section_count` sections
pub fn estimated_length(task_type: TaskType, section_count: usize) -> String {
    match task_type.output_format() {
        OutputFormat::Slides => format!("{} to {} slides", section_count, section_count + 3),
        OutputFormat::Sheet => format!("{} tabs", section_count),
        OutputFormat::Docs | OutputFormat::Email | OutputFormat::Chat => word_range(task_type).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE_VOCABULARY: &[&str] = &[
        "customer_360",
        "stakeholders",
        "contract_terms",
        "knowledge_base",
        "usage_data",
        "engagement_metrics",
        "meeting_history",
        "health_trends",
        "renewal_forecast",
        "previous_artifacts",
        "risk_signals",
        "support_tickets",
        "email_threads",
        "portfolio_data",
        "team_metrics",
        "transcripts",
    ];

    #[test]
    fn test_every_type_has_three_to_seven_sections() {
        for task_type in TaskType::ALL.iter() {
            let count = default_sections(*task_type).len();
            assert!((3..=7).contains(&count), "{} has {} sections", task_type, count);
        }
    }

    #[test]
    fn test_section_sources_use_known_vocabulary() {
        for task_type in TaskType::ALL.iter() {
            for (name, _, sources) in default_sections(*task_type) {
                assert!(!sources.is_empty(), "{}: {} has no sources", task_type, name);
                for source in *sources {
                    assert!(SOURCE_VOCABULARY.contains(source), "{}: unknown source {}", task_type, source);
                }
            }
        }
    }

    #[test]
    fn test_estimated_length_by_format() {
        assert_eq!(estimated_length(TaskType::QbrGeneration, 6), "6 to 9 slides");
        assert_eq!(estimated_length(TaskType::TeamMetrics, 3), "3 tabs");
        assert_eq!(estimated_length(TaskType::EmailDrafting, 4), "150-300 words");
        assert_eq!(estimated_length(TaskType::RiskAssessment, 5), "800-1,500 words");
    }

    #[test]
    fn test_plan_sections_copy_template() {
        let sections = default_plan_sections(TaskType::QbrGeneration);
        assert_eq!(sections[0].name, "Executive Summary");
        assert_eq!(sections[1].data_sources, vec!["health_trends", "engagement_metrics"]);
    }
}
