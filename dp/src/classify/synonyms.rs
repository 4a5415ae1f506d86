//! Synonym expansion
//!
//! Produces alternate phrasings of a query by swapping in domain synonyms so
//! that "put together a QBR" and "build a QBR" reach the same patterns.

/// Groups of interchangeable words and phrases
pub const SYNONYM_GROUPS: &[&[&str]] = &[
    &[
        "create",
        "build",
        "generate",
        "make",
        "draft",
        "prepare",
        "put together",
        "write",
        "develop",
        "produce",
    ],
    &["plan", "strategy", "roadmap", "playbook"],
    &["meeting", "call", "sync", "session"],
    &["customer", "client", "account"],
    &["risk", "churn", "threat"],
    &["renewal", "renew", "contract renewal"],
    &["deck", "presentation", "slides"],
    &["document", "doc", "report", "writeup"],
    &["summary", "recap", "overview"],
    &["analyze", "analyse", "review", "assess", "evaluate"],
    &["email", "message", "note"],
];

/// Expand a query into variants
///
/// The first element is always the query itself, untouched. Multi-word
/// members found anywhere in the lowercased query produce one whole-phrase
/// substitution per other group member. Then each word position holding a
/// single-word member produces one variant per other group member with only
/// that position replaced. Variants are lowercase and are not deduplicated.
pub fn expand(query: &str) -> Vec<String> {
    let mut variants = vec![query.to_string()];
    let lower = query.to_lowercase();

    for group in SYNONYM_GROUPS {
        for member in group.iter().filter(|m| m.contains(' ')) {
            if lower.contains(member) {
                for other in group.iter().filter(|o| *o != member) {
                    variants.push(lower.replace(member, other));
                }
            }
        }
    }

    let words: Vec<&str> = lower.split_whitespace().collect();
    for (idx, word) in words.iter().enumerate() {
        let core = word.trim_matches(|c: char| !c.is_alphanumeric());
        if core.is_empty() {
            continue;
        }
        let lead = word.len() - word.trim_start_matches(|c: char| !c.is_alphanumeric()).len();

        for group in SYNONYM_GROUPS {
            if !group.contains(&core) {
                continue;
            }
            for other in group.iter().filter(|o| **o != core) {
                let replaced = format!("{}{}{}", &word[..lead], other, &word[lead + core.len()..]);
                let mut parts: Vec<&str> = words.clone();
                parts[idx] = &replaced;
                variants.push(parts.join(" "));
            }
        }
    }

    variants
}
