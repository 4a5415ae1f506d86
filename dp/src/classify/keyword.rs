//! Weighted keyword scoring
//!
//! Looser than phrase matching: each task type owns a list of representative
//! keywords, scored against every synonym variant by exact substring first and
//! by stemmed-token overlap second.

use std::collections::HashMap;

use tracing::debug;

use super::normalizer::{content_word_count, normalize};
use crate::domain::TaskType;

/// Keyword confidences stay below the phrase-hit confidence
pub const KEYWORD_CONFIDENCE_CAP: f64 = 0.9;

/// Added to the normalized score to form a confidence
pub const KEYWORD_CONFIDENCE_OFFSET: f64 = 0.3;

/// Weight per word of an exact substring hit
const EXACT_WEIGHT: f64 = 1.5;

/// Floor of the score divisor so very short queries are not over-rewarded
const MIN_DIVISOR: usize = 3;

/// Keyword lists per task type, in catalog order
pub const KEYWORDS: &[(TaskType, &[&str])] = &[
    (
        TaskType::KickoffPlan,
        &[
            "kickoff",
            "kick-off",
            "kick off",
            "kickoff deck",
            "kickoff meeting",
            "kickoff agenda",
            "onboarding kickoff",
            "welcome call",
            "welcome deck",
            "introductory meeting",
            "project kickoff",
            "implementation kickoff",
            "launch meeting",
            "new customer",
            "newly signed",
            "just signed",
            "first meeting",
            "onboarding agenda",
            "team introductions",
            "success criteria",
            "goals and objectives",
        ],
    ),
    (
        TaskType::MilestonePlan,
        &[
            "30-60-90",
            "30 60 90",
            "milestone",
            "milestones",
            "milestone plan",
            "onboarding plan",
            "onboarding timeline",
            "onboarding milestones",
            "time to value",
            "go-live",
            "go live",
            "implementation plan",
            "implementation timeline",
            "rollout plan",
            "first 90 days",
            "day plan",
            "phased rollout",
            "launch plan",
            "onboarding roadmap",
            "onboarding schedule",
        ],
    ),
    (
        TaskType::StakeholderMap,
        &[
            "stakeholder",
            "stakeholders",
            "stakeholder map",
            "org chart",
            "decision maker",
            "decision makers",
            "buying committee",
            "power map",
            "influence map",
            "key contacts",
            "who's who",
            "economic buyer",
            "sponsor",
            "executive sponsor",
            "relationship map",
            "contact map",
            "raci",
            "roles and responsibilities",
            "champions and detractors",
            "personas",
        ],
    ),
    (
        TaskType::TrainingSchedule,
        &[
            "training schedule",
            "training calendar",
            "training sessions",
            "session schedule",
            "schedule training",
            "training dates",
            "workshop schedule",
            "enablement schedule",
            "onboarding training",
            "training agenda",
            "class schedule",
            "webinar schedule",
            "admin training",
            "end user training",
            "train the trainer",
            "training times",
            "book training",
        ],
    ),
    (
        TaskType::UsageAnalysis,
        &[
            "usage",
            "usage analysis",
            "usage report",
            "usage trends",
            "product usage",
            "feature usage",
            "adoption metrics",
            "adoption rate",
            "active users",
            "daily active",
            "monthly active",
            "login",
            "logins",
            "license utilization",
            "seat utilization",
            "utilization",
            "engagement",
            "how much are they using",
            "usage drop",
            "usage data",
            "telemetry",
        ],
    ),
    (
        TaskType::FeatureCampaign,
        &[
            "feature campaign",
            "adoption campaign",
            "feature adoption",
            "drive adoption",
            "increase adoption",
            "promote feature",
            "new feature",
            "feature launch",
            "feature rollout",
            "in-app",
            "nudge",
            "campaign",
            "email campaign",
            "underused features",
            "unused features",
            "feature awareness",
            "activation",
            "adoption push",
            "feature enablement",
            "release notes",
        ],
    ),
    (
        TaskType::ChampionDevelopment,
        &[
            "champion",
            "champions",
            "champion program",
            "champion development",
            "power user",
            "power users",
            "advocate",
            "advocates",
            "advocacy",
            "internal champion",
            "super user",
            "super users",
            "executive champion",
            "grow champions",
            "champion network",
            "reference customer",
            "customer advocate",
            "evangelist",
            "ambassador",
            "user community",
        ],
    ),
    (
        TaskType::TrainingProgram,
        &[
            "training program",
            "training curriculum",
            "curriculum",
            "enablement",
            "enablement program",
            "certification",
            "learning path",
            "academy",
            "courses",
            "education",
            "upskill",
            "training content",
            "training materials",
            "best practices training",
            "user training",
            "admin certification",
            "knowledge transfer",
            "workshop series",
        ],
    ),
    (
        TaskType::RenewalForecast,
        &[
            "renewal forecast",
            "forecast",
            "renewal likelihood",
            "renewal probability",
            "likely to renew",
            "will they renew",
            "renewal outlook",
            "renewal prediction",
            "renewal risk",
            "renewal date",
            "renewal status",
            "contract end",
            "contract expiration",
            "renewal health",
            "gross retention",
            "net retention",
            "churn probability",
            "forecast renewal",
            "renewal confidence",
            "renewal commit",
            "upcoming renewal",
            "renewal",
        ],
    ),
    (
        TaskType::ValueSummary,
        &[
            "value summary",
            "value realization",
            "value delivered",
            "return on investment",
            "roi analysis",
            "business value",
            "value story",
            "value recap",
            "outcomes achieved",
            "success story",
            "impact summary",
            "time saved",
            "cost savings",
            "business outcomes",
            "value review",
            "realized value",
            "proof of value",
            "value assessment",
            "case study",
            "achievements",
            "results delivered",
        ],
    ),
    (
        TaskType::ExpansionProposal,
        &[
            "expansion proposal",
            "upsell",
            "upsell proposal",
            "cross-sell",
            "cross sell",
            "add-on",
            "additional licenses",
            "more seats",
            "seat expansion",
            "upgrade proposal",
            "upgrade",
            "pricing proposal",
            "proposal",
            "expansion deck",
            "new module",
            "tier upgrade",
            "enterprise tier",
            "license expansion",
            "commercial proposal",
            "quote",
        ],
    ),
    (
        TaskType::NegotiationBrief,
        &[
            "negotiation",
            "negotiation brief",
            "negotiate",
            "pricing negotiation",
            "discount",
            "discount request",
            "price increase",
            "uplift",
            "procurement",
            "contract terms",
            "leverage",
            "walk away",
            "concessions",
            "counter offer",
            "counteroffer",
            "pricing pushback",
            "redlines",
            "contract negotiation",
            "deal terms",
            "bargaining",
        ],
    ),
    (
        TaskType::RiskAssessment,
        &[
            "risk assessment",
            "churn risk",
            "risk",
            "risks",
            "at risk",
            "risk factors",
            "risk drivers",
            "warning signs",
            "red flags",
            "health decline",
            "declining usage",
            "risk score",
            "churn signals",
            "assess risk",
            "likelihood of churn",
            "churn",
            "risk analysis",
            "risk review",
            "danger",
            "vulnerable",
        ],
    ),
    (
        TaskType::SavePlay,
        &[
            "save play",
            "save plan",
            "save the account",
            "save the customer",
            "retention plan",
            "retention strategy",
            "win back",
            "winback",
            "prevent churn",
            "stop churn",
            "keep the customer",
            "rescue",
            "turnaround",
            "recovery plan",
            "retain",
            "retention offer",
            "churn prevention",
            "save motion",
            "get back on track",
            "salvage",
        ],
    ),
    (
        TaskType::EscalationReport,
        &[
            "escalation",
            "escalation report",
            "escalate",
            "escalated",
            "sev1",
            "sev 1",
            "critical issue",
            "outage",
            "incident",
            "incident report",
            "executive escalation",
            "complaint",
            "angry customer",
            "postmortem",
            "post-mortem",
            "root cause",
            "service failure",
            "escalation summary",
            "urgent issue",
        ],
    ),
    (
        TaskType::ResolutionPlan,
        &[
            "resolution plan",
            "resolve",
            "resolution",
            "remediation",
            "remediation plan",
            "fix plan",
            "action plan",
            "corrective action",
            "open tickets",
            "support tickets",
            "ticket backlog",
            "bug fixes",
            "workaround",
            "issue tracker",
            "path to resolution",
            "close out issues",
            "mitigation plan",
            "mitigation",
            "next steps to resolve",
        ],
    ),
    (
        TaskType::QbrGeneration,
        &[
            "qbr",
            "quarterly business review",
            "business review",
            "quarterly review",
            "executive business review",
            "quarterly",
            "quarter review",
            "qbr deck",
            "review deck",
            "quarterly recap",
            "quarterly results",
            "quarter in review",
            "last quarter",
            "this quarter",
            "q1 review",
            "q2 review",
            "q3 review",
            "q4 review",
            "quarterly meeting",
            "review meeting",
        ],
    ),
    (
        TaskType::ExecutiveBriefing,
        &[
            "executive briefing",
            "exec brief",
            "executive brief",
            "briefing",
            "executive summary",
            "exec summary",
            "c-level",
            "c-suite",
            "ceo",
            "cfo",
            "leadership update",
            "board meeting",
            "exec sponsor update",
            "talking points for execs",
            "executive meeting",
            "leadership briefing",
            "executive audience",
            "for leadership",
            "senior leadership",
            "executive update",
        ],
    ),
    (
        TaskType::AccountPlan,
        &[
            "account plan",
            "account planning",
            "strategic account plan",
            "success plan",
            "customer success plan",
            "account strategy",
            "strategic plan",
            "annual plan",
            "account goals",
            "joint success plan",
            "mutual success plan",
            "account roadmap",
            "growth plan",
            "territory plan",
            "relationship strategy",
            "long-term plan",
            "objectives and key results",
            "okrs",
            "account objectives",
        ],
    ),
    (
        TaskType::TransformationRoadmap,
        &[
            "transformation",
            "transformation roadmap",
            "digital transformation",
            "roadmap",
            "multi-year",
            "multi year",
            "long-term roadmap",
            "maturity model",
            "maturity",
            "future state",
            "target state",
            "vision",
            "phased approach",
            "modernization",
            "journey map",
            "strategic roadmap",
            "change management",
            "operating model",
            "capability roadmap",
        ],
    ),
    (
        TaskType::PortfolioDashboard,
        &[
            "portfolio",
            "portfolio dashboard",
            "portfolio overview",
            "portfolio health",
            "book of business",
            "all my accounts",
            "all accounts",
            "my accounts",
            "dashboard",
            "account list",
            "across accounts",
            "across my portfolio",
            "portfolio summary",
            "health distribution",
            "customer base",
            "segment overview",
            "overall health",
            "account roster",
            "portfolio review",
            "my customers",
        ],
    ),
    (
        TaskType::TeamMetrics,
        &[
            "team metrics",
            "team performance",
            "csm performance",
            "csm metrics",
            "team dashboard",
            "kpis",
            "kpi",
            "workload",
            "capacity",
            "team capacity",
            "leaderboard",
            "my team",
            "csm workload",
            "activity metrics",
            "coverage ratio",
            "team goals",
            "quota",
            "team scorecard",
            "productivity",
        ],
    ),
    (
        TaskType::RenewalPipeline,
        &[
            "renewal pipeline",
            "pipeline",
            "upcoming renewals",
            "renewals due",
            "renewals this quarter",
            "renewals next quarter",
            "renewal calendar",
            "renewal list",
            "renewal schedule",
            "renewals",
            "expiring contracts",
            "contracts expiring",
            "renewal report",
            "renewal tracker",
            "up for renewal",
            "renewal dates",
            "next 90 days",
            "renewal queue",
            "renewal cohort",
        ],
    ),
    (
        TaskType::AtRiskOverview,
        &[
            "at-risk accounts",
            "at risk accounts",
            "at-risk customers",
            "at risk customers",
            "at-risk overview",
            "at-risk list",
            "risky accounts",
            "red accounts",
            "accounts at risk",
            "customers at risk",
            "which accounts",
            "churning accounts",
            "churn list",
            "watch list",
            "watchlist",
            "red list",
            "health alerts",
            "accounts in trouble",
            "low health accounts",
            "declining accounts",
        ],
    ),
    (
        TaskType::DataAnalysis,
        &[
            "data analysis",
            "analyze data",
            "analyse data",
            "analysis",
            "analyze",
            "analyse",
            "data",
            "spreadsheet",
            "excel",
            "csv",
            "pivot",
            "pivot table",
            "chart",
            "charts",
            "graph",
            "trend analysis",
            "correlation",
            "breakdown",
            "metrics",
            "numbers",
            "statistics",
            "crunch",
        ],
    ),
    (
        TaskType::PresentationCreation,
        &[
            "presentation",
            "deck",
            "slides",
            "slide deck",
            "slide",
            "powerpoint",
            "keynote",
            "google slides",
            "pitch deck",
            "create a presentation",
            "build a deck",
            "make slides",
            "present",
            "presenting",
            "talk track",
            "visuals",
            "slideshow",
            "demo deck",
            "overview deck",
            "training deck",
            "webinar slides",
        ],
    ),
    (
        TaskType::DocumentCreation,
        &[
            "document",
            "doc",
            "write up",
            "writeup",
            "write-up",
            "report",
            "memo",
            "brief",
            "proposal document",
            "google doc",
            "word doc",
            "whitepaper",
            "white paper",
            "summary document",
            "documentation",
            "written report",
            "one-pager",
            "one pager",
            "outline",
            "draft a document",
            "policy",
        ],
    ),
    (
        TaskType::EmailDrafting,
        &[
            "email",
            "e-mail",
            "draft email",
            "write an email",
            "follow-up email",
            "follow up email",
            "follow-up",
            "follow up",
            "reply",
            "respond",
            "response",
            "message",
            "send a note",
            "outreach",
            "check-in email",
            "thank you note",
            "intro email",
            "introduction email",
            "reach out",
            "inbox",
            "compose",
        ],
    ),
    (
        TaskType::MeetingPrep,
        &[
            "meeting prep",
            "prep",
            "prepare for",
            "meeting",
            "call",
            "sync",
            "agenda",
            "talking points",
            "briefing notes",
            "before the call",
            "before our call",
            "before the meeting",
            "upcoming meeting",
            "next meeting",
            "call prep",
            "discussion points",
            "questions to ask",
            "pre-call",
            "pre-meeting",
            "get ready for",
        ],
    ),
    (
        TaskType::TranscriptionSummary,
        &[
            "transcript",
            "transcription",
            "recording",
            "call recording",
            "meeting recording",
            "summarize the call",
            "summarize the meeting",
            "call summary",
            "meeting summary",
            "meeting notes",
            "call notes",
            "recap",
            "minutes",
            "meeting minutes",
            "action items",
            "what was discussed",
            "key takeaways",
            "takeaways",
            "zoom recording",
            "notes from",
        ],
    ),
    (
        TaskType::HealthAnalysis,
        &[
            "health",
            "health score",
            "health analysis",
            "health check",
            "health trend",
            "why is health",
            "health dropped",
            "health breakdown",
            "health drivers",
            "customer health",
            "account health",
            "healthy",
            "unhealthy",
            "red health",
            "yellow health",
            "score drop",
            "health factors",
            "explain health",
            "nps",
            "csat",
        ],
    ),
    (
        TaskType::ExpansionPlanning,
        &[
            "expansion",
            "expansion planning",
            "expansion opportunities",
            "growth opportunities",
            "whitespace",
            "white space",
            "cross-sell opportunities",
            "upsell opportunities",
            "expand",
            "growth",
            "land and expand",
            "new departments",
            "new use cases",
            "additional teams",
            "wallet share",
            "share of wallet",
            "expansion potential",
            "grow the account",
            "expansion plan",
            "net new",
        ],
    ),
];

/// Best keyword-derived guess
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordMatch {
    pub task_type: TaskType,
    pub confidence: f64,
}

impl KeywordMatch {
    /// No keyword hit at all
    pub fn none() -> Self {
        Self {
            task_type: TaskType::Custom,
            confidence: 0.0,
        }
    }
}

/// Best match plus the normalized score of every task type
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordScores {
    pub best: KeywordMatch,
    pub scores: HashMap<TaskType, f64>,
}

impl KeywordScores {
    /// Normalized score for a task type, zero when absent
    pub fn score(&self, task_type: TaskType) -> f64 {
        self.scores.get(&task_type).copied().unwrap_or(0.0)
    }
}

/// Confidence for a normalized keyword score
pub fn keyword_confidence(score: f64) -> f64 {
    (score + KEYWORD_CONFIDENCE_OFFSET).min(KEYWORD_CONFIDENCE_CAP)
}

/// Score `query` and its synonym variants against the built-in keyword table
pub fn score(query: &str, variants: &[String]) -> KeywordScores {
    score_with(KEYWORDS, query, variants)
}

/// Score against an arbitrary keyword table
///
/// Types are visited in table order and only a strictly greater score
/// replaces the running best, so ties go to the earlier type.
pub fn score_with(table: &[(TaskType, &[&str])], query: &str, variants: &[String]) -> KeywordScores {
    let lowered: Vec<String> = variants.iter().map(|v| v.to_lowercase()).collect();
    let tokenized: Vec<Vec<String>> = variants.iter().map(|v| normalize(v)).collect();
    let divisor = content_word_count(query).max(MIN_DIVISOR) as f64;

    let mut scores = HashMap::with_capacity(table.len());
    let mut best: Option<(TaskType, f64)> = None;

    for (task_type, keywords) in table {
        let raw: f64 = keywords
            .iter()
            .map(|keyword| keyword_points(keyword, &lowered, &tokenized))
            .sum();
        let normalized = raw / divisor;
        scores.insert(*task_type, normalized);

        if normalized > 0.0 && best.is_none_or(|(_, top)| normalized > top) {
            best = Some((*task_type, normalized));
        }
    }

    let best = match best {
        Some((task_type, top)) => KeywordMatch {
            task_type,
            confidence: keyword_confidence(top),
        },
        None => KeywordMatch::none(),
    };
    debug!(task_type = %best.task_type, confidence = best.confidence, "score_with: best keyword match");

    KeywordScores { best, scores }
}

/// Points one keyword earns against the variant set
fn keyword_points(keyword: &str, lowered: &[String], tokenized: &[Vec<String>]) -> f64 {
    if lowered.iter().any(|variant| variant.contains(keyword)) {
        return EXACT_WEIGHT * keyword.split_whitespace().count() as f64;
    }

    let keyword_tokens = normalize(keyword);
    if keyword_tokens.is_empty() {
        return 0.0;
    }

    let matched = tokenized.iter().any(|variant_tokens| {
        keyword_tokens
            .iter()
            .all(|kt| variant_tokens.iter().any(|vt| tokens_match(kt, vt)))
    });

    if matched { keyword_tokens.len() as f64 } else { 0.0 }
}

/// Equality or either-direction prefix
fn tokens_match(a: &str, b: &str) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::synonyms::expand;

    const TABLE: &[(TaskType, &[&str])] = &[
        (TaskType::RiskAssessment, &["churn risk", "warning"]),
        (TaskType::SavePlay, &["save play", "warning"]),
        (TaskType::QbrGeneration, &["quarterly"]),
    ];

    fn run(table: &[(TaskType, &[&str])], query: &str) -> KeywordScores {
        score_with(table, query, &[query.to_string()])
    }

    #[test]
    fn test_exact_hit_weighs_words() {
        // "churn risk" is 2 words: 3.0 raw, divisor max(3, 3) = 3
        let result = run(TABLE, "churn risk review");
        assert_eq!(result.best.task_type, TaskType::RiskAssessment);
        assert!((result.score(TaskType::RiskAssessment) - 1.0).abs() < 1e-9);
        assert!((result.best.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_stem_prefix_hit_counts_tokens() {
        // No exact substring for "churn risk", but both stemmed tokens appear
        let result = run(TABLE, "risks of churning");
        assert!((result.score(TaskType::RiskAssessment) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        let result = run(TABLE, "warning");
        assert_eq!(result.score(TaskType::RiskAssessment), result.score(TaskType::SavePlay));
        assert_eq!(result.best.task_type, TaskType::RiskAssessment);
        // 1.5 / 3 + 0.3
        assert!((result.best.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_long_queries_are_normalized() {
        let short = run(TABLE, "quarterly");
        let long = run(TABLE, "quarterly numbers for the whole region and every product line");
        assert!(long.score(TaskType::QbrGeneration) < short.score(TaskType::QbrGeneration));
    }

    #[test]
    fn test_no_hits_is_custom_zero() {
        let result = run(TABLE, "xyzzy plugh");
        assert_eq!(result.best, KeywordMatch::none());
        assert!(result.scores.values().all(|s| *s == 0.0));
    }

    #[test]
    fn test_confidence_capped() {
        assert_eq!(keyword_confidence(5.0), KEYWORD_CONFIDENCE_CAP);
        assert!((keyword_confidence(0.2) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_builtin_table_covers_every_type_but_custom() {
        let covered: Vec<TaskType> = KEYWORDS.iter().map(|(tt, _)| *tt).collect();
        let expected: Vec<TaskType> = TaskType::ALL.iter().copied().filter(|t| !t.is_custom()).collect();
        assert_eq!(covered, expected);
        assert!(KEYWORDS.iter().all(|(_, kws)| kws.len() >= 15));
    }

    #[test]
    fn test_builtin_table_scores_realistic_queries() {
        let query = "who are the decision makers on their buying committee";
        let result = score(query, &expand(query));
        assert_eq!(result.best.task_type, TaskType::StakeholderMap);

        let query = "xyzzy plugh frobnicate";
        assert_eq!(score(query, &expand(query)).best, KeywordMatch::none());
    }
}
