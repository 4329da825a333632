//! Prompt text for the reasoning stages. Every prompt asks for a single JSON
//! object so replies go straight through `json::parse_reply`.

pub const PATTERN_ANALYSIS_SYSTEM: &str = "\
You are a senior fraud analyst with a penetration-testing background.
A concerned, non-technical user has reported the case below; they may be misinformed.
Decide whether the case is a real potential fraud.
Only flag fraud when clear patterns imply illegal activity. Ordinary buyer/seller
disputes without deception are not fraud. Technically implausible scenarios, cases
based on misconceptions, and cases without enough information are not fraud; say why.
Similar historical cases are provided as context only.
Reply with JSON only:
{\"is_fraud\": bool, \"patterns\": [string], \"reasoning\": string}";

pub const TYPE_CLASSIFICATION_SYSTEM: &str = "\
You are a fraud taxonomy expert. Classify the confirmed fraud case into a broad,
reusable category that captures its core deceptive mechanism, not its surface details.
Strongly prefer one of the known types. Propose a new type only when the mechanism is
fundamentally different from every known type.
Reply with JSON only:
{\"fraud_type\": string, \"explanation\": string, \"new_type_name\": string or null}
Use a known type name verbatim for fraud_type when one fits and set new_type_name to null.
Otherwise set fraud_type to \"NEW\" and new_type_name to an UPPER_SNAKE_CASE name.";

pub const SUMMARY_SYSTEM: &str = "\
You are a fraud prevention expert. Write a clear, concise and abstract summary of the
fraud analysis below, with concrete warning signs and practical precautions.
Reply with JSON only:
{\"summary\": string, \"warning_signs\": [string], \"precautions\": [string]}";

/// Sentinel the classifier uses for "none of the known types".
pub const NEW_TYPE_SENTINEL: &str = "NEW";

pub fn pattern_analysis_user(text: &str, similar_cases: &[String]) -> String {
    let mut prompt = format!("Analyze this report for fraud patterns:\n\n{text}\n");
    if similar_cases.is_empty() {
        prompt.push_str("\nNo similar historical cases were found.\n");
    } else {
        prompt.push_str("\nSimilar historical cases (most similar first):\n");
        for (i, case) in similar_cases.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, case));
        }
    }
    prompt
}

pub fn type_classification_user(
    text: &str,
    patterns: &[String],
    reasoning: &str,
    known_types: &[String],
) -> String {
    let known = if known_types.is_empty() {
        "(none yet)".to_string()
    } else {
        known_types.join(", ")
    };
    format!(
        "Classify this fraud case.\n\nReport: {text}\nPatterns: {}\nAnalysis: {reasoning}\n\nKnown fraud types: {known}",
        patterns.join("; ")
    )
}

pub fn summary_user(analysis_json: &str) -> String {
    format!("Summarize this fraud analysis:\n\n{analysis_json}")
}
