//! Phrase matching
//!
//! High-specificity regexes per task type. A hit is the strongest signal the
//! cascade has and short-circuits everything after it.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::domain::TaskType;

/// Confidence of every phrase hit
pub const PHRASE_CONFIDENCE: f64 = 0.95;

/// Raw patterns per task type, in catalog order
const PHRASE_PATTERNS: &[(TaskType, &[&str])] = &[
    (
        TaskType::KickoffPlan,
        &[
            r"\bbuild (me )?a kick-?off\b",
            r"\bkick-?off (plan|deck|presentation|meeting|agenda)\b",
            r"\bonboarding kick-?off\b",
        ],
    ),
    (
        TaskType::MilestonePlan,
        &[
            r"\b30[- /]60[- /]90\b",
            r"\bmilestone plan\b",
            r"\bonboarding (milestones|timeline)\b",
        ],
    ),
    (
        TaskType::StakeholderMap,
        &[
            r"\bstakeholder (map|mapping|matrix)\b",
            r"\bmap (out )?(the |their |our )?stakeholders\b",
            r"\bwho are the (key )?stakeholders\b",
        ],
    ),
    (
        TaskType::TrainingSchedule,
        &[r"\btraining (schedule|calendar)\b", r"\bschedule (the |their )?trainings?\b"],
    ),
    (
        TaskType::UsageAnalysis,
        &[
            r"\busage (analysis|report|trends?|breakdown)\b",
            r"\banaly[sz]e (the |their |our )?(product |feature )?usage\b",
            r"\bhow (much|often) (are|is) .{0,40}\busing\b",
        ],
    ),
    (
        TaskType::FeatureCampaign,
        &[
            r"\bfeature (adoption )?campaign\b",
            r"\badoption campaign\b",
            r"\bdrive adoption of\b",
        ],
    ),
    (
        TaskType::ChampionDevelopment,
        &[
            r"\bchampion (development|program|plan|building)\b",
            r"\b(develop|build|find|identify|grow) (a |new |more )?champions?\b",
        ],
    ),
    (
        TaskType::TrainingProgram,
        &[r"\btraining (program|curriculum|plan)\b", r"\benablement (program|plan)\b"],
    ),
    (
        TaskType::RenewalForecast,
        &[
            r"\brenewal forecast\b",
            r"\bforecast (the |our |their |a )?renewals?\b",
            r"\brenewal (likelihood|probability|outlook|prediction)\b",
            r"\blikel(y|ihood) to renew\b",
        ],
    ),
    (
        TaskType::ValueSummary,
        &[
            r"\bvalue (summary|realization|recap|story)\b",
            r"\broi (summary|analysis|report)\b",
            r"\bvalue (we'?ve |they'?ve )?(delivered|realized)\b",
        ],
    ),
    (
        TaskType::ExpansionProposal,
        &[
            r"\bexpansion proposal\b",
            r"\bupsell (proposal|deck|pitch)\b",
            r"\bcross-?sell (proposal|deck|pitch)\b",
        ],
    ),
    (
        TaskType::NegotiationBrief,
        &[
            r"\bnegotiation (brief|prep|strategy|plan)\b",
            r"\bprep(are)? (me )?for (the |a |our )?negotiation\b",
            r"\bpricing negotiation\b",
        ],
    ),
    (
        TaskType::RiskAssessment,
        &[
            r"\brisk assessment\b",
            r"\bassess (the |their )?(churn )?risk\b",
            r"\bchurn risk (analysis|assessment|report)\b",
        ],
    ),
    (
        TaskType::SavePlay,
        &[
            r"\bsave play\b",
            r"\bsave (the |this )?(account|customer|deal)\b",
            r"\bprevent (them from )?churn(ing)?\b",
        ],
    ),
    (
        TaskType::EscalationReport,
        &[r"\bescalation (report|summary|brief)\b", r"\bescalate (this|the issue)\b"],
    ),
    (
        TaskType::ResolutionPlan,
        &[
            r"\bresolution plan\b",
            r"\bremediation plan\b",
            r"\bplan to (resolve|fix|remediate)\b",
        ],
    ),
    (
        TaskType::QbrGeneration,
        &[
            r"\bqbr\b",
            r"\bquarterly business review\b",
            r"\bbusiness review (deck|presentation)\b",
        ],
    ),
    (
        TaskType::ExecutiveBriefing,
        &[
            r"\bexec(utive)? (brief|briefing)\b",
            r"\bbrief (the |our |their )?(execs?|executives?|cxo|ceo|cfo|cio|vp)\b",
        ],
    ),
    (
        TaskType::AccountPlan,
        &[r"\b(strategic )?account plan\b", r"\baccount strategy\b", r"\bsuccess plan\b"],
    ),
    (
        TaskType::TransformationRoadmap,
        &[
            r"\btransformation roadmap\b",
            r"\bdigital transformation\b",
            r"\bmulti-?year roadmap\b",
        ],
    ),
    (
        TaskType::PortfolioDashboard,
        &[
            r"\bportfolio (dashboard|overview|summary|health)\b",
            r"\bbook of business\b",
            r"\ball (of )?my (accounts|customers)\b",
        ],
    ),
    (
        TaskType::TeamMetrics,
        &[
            r"\bteam (metrics|performance|dashboard|kpis?)\b",
            r"\bcsm (metrics|performance|workload)\b",
        ],
    ),
    (
        TaskType::RenewalPipeline,
        &[
            r"\brenewal pipeline\b",
            r"\bupcoming renewals\b",
            r"\brenewals (due|coming up|this quarter|next quarter)\b",
        ],
    ),
    (
        TaskType::AtRiskOverview,
        &[
            r"\bat[- ]risk (accounts|customers|overview|list)\b",
            r"\bwhich (accounts|customers) are (at[- ]risk|churning)\b",
        ],
    ),
    (
        TaskType::DataAnalysis,
        &[
            r"\bdata analysis\b",
            r"\banaly[sz]e (this|the|that) data\b",
            r"\bpivot table\b",
        ],
    ),
    (
        TaskType::PresentationCreation,
        &[r"\b(create|build|make|put together) (a |the )?(slide )?(deck|presentation)\b"],
    ),
    (
        TaskType::DocumentCreation,
        &[r"\b(write|create|draft) (a |the )?(document|doc|writeup|write-up)\b"],
    ),
    (
        TaskType::EmailDrafting,
        &[
            r"\b(draft|write|compose|send) (an? |the )?(follow[- ]up )?email\b",
            r"\bfollow[- ]up email\b",
            r"\bemail (to|draft)\b",
        ],
    ),
    (
        TaskType::MeetingPrep,
        &[
            r"\bmeeting (prep|preparation|brief)\b",
            r"\bcall (prep|preparation)\b",
            r"\bprep(are)? (me )?for (my |our |the |a |an )?(\w+ )?(call|meeting|sync)\b",
        ],
    ),
    (
        TaskType::TranscriptionSummary,
        &[
            r"\b(summari[sz]e|recap) (the |this |my |our )?(call |meeting )?(transcript|recording)\b",
            r"\btranscript summary\b",
            r"\bmeeting (notes|recap|summary)\b",
        ],
    ),
    (
        TaskType::HealthAnalysis,
        &[r"\bhealth (analysis|check|score|trend)s?\b", r"\bhow healthy\b"],
    ),
    (
        TaskType::ExpansionPlanning,
        &[
            r"\bexpansion (plan|planning|opportunit(y|ies))\b",
            r"\bwhite ?space\b",
            r"\bgrowth opportunit(y|ies)\b",
        ],
    ),
];

/// Compiled pattern table; the patterns are literals so compilation cannot fail at runtime
static COMPILED: LazyLock<Vec<(TaskType, Vec<Regex>)>> = LazyLock::new(|| {
    PHRASE_PATTERNS
        .iter()
        .map(|(task_type, patterns)| {
            let compiled = patterns
                .iter()
                .map(|p| Regex::new(&format!("(?i){}", p)).expect("phrase pattern must compile"))
                .collect();
            (*task_type, compiled)
        })
        .collect()
});

/// Result of phrase matching
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhraseMatch {
    pub task_type: TaskType,
    pub confidence: f64,
}

impl PhraseMatch {
    fn miss() -> Self {
        Self {
            task_type: TaskType::Custom,
            confidence: 0.0,
        }
    }

    pub fn is_hit(&self) -> bool {
        !self.task_type.is_custom()
    }
}

/// First task type, in catalog order, with a pattern matching `text`
fn first_hit(text: &str) -> Option<TaskType> {
    COMPILED
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(text)))
        .map(|(task_type, _)| *task_type)
}

/// Match the query, then its synonym variants
///
/// `variants[0]` is the original query; it is tested alone first so synonym
/// substitution cannot override a match on what the user actually wrote.
pub fn match_phrases(variants: &[String]) -> PhraseMatch {
    let Some(original) = variants.first() else {
        return PhraseMatch::miss();
    };

    if let Some(task_type) = first_hit(original) {
        debug!(%task_type, "match_phrases: original query hit");
        return PhraseMatch {
            task_type,
            confidence: PHRASE_CONFIDENCE,
        };
    }

    for variant in &variants[1..] {
        if let Some(task_type) = first_hit(variant) {
            debug!(%task_type, %variant, "match_phrases: variant hit");
            return PhraseMatch {
                task_type,
                confidence: PHRASE_CONFIDENCE,
            };
        }
    }

    PhraseMatch::miss()
}
