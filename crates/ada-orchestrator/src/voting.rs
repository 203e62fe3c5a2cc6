//! Majority vote over tool outputs.
//!
//! Pure and deterministic: randomness lives upstream in how the responses
//! were produced, never in the aggregation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::task::ToolOutput;

/// Default minimum mean confidence for consensus.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Bucket used when no output carried a response.
pub const NO_RESPONSE: &str = "no_response";

/// Result of a vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub is_consensus: bool,
    /// Bucket with the highest count; the first seen wins among tied buckets.
    pub majority_decision: Option<String>,
    /// Mean confidence of the valid responses.
    pub confidence: f64,
    pub vote_distribution: BTreeMap<String, usize>,
    pub raw_responses: Vec<ToolOutput>,
}

impl VoteOutcome {
    /// Consensus on exactly `decision` (compared normalized).
    pub fn confirms(&self, decision: &str) -> bool {
        self.is_consensus
            && self.majority_decision.as_deref() == Some(decision.trim().to_lowercase().as_str())
    }

    /// Whether the top buckets are tied.
    pub fn is_tie(&self) -> bool {
        let max = self.vote_distribution.values().copied().max().unwrap_or(0);
        max > 0 && self.vote_distribution.values().filter(|&&v| v == max).count() > 1
    }

    /// `confirm: 2, reject: 1`
    pub fn distribution_label(&self) -> String {
        self.vote_distribution
            .iter()
            .map(|(decision, count)| format!("{decision}: {count}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Majority vote with a configurable confidence threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MajorityVote {
    threshold: f64,
}

impl Default for MajorityVote {
    fn default() -> Self {
        Self { threshold: DEFAULT_CONFIDENCE_THRESHOLD }
    }
}

impl MajorityVote {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Aggregates `outputs` into a [`VoteOutcome`].
    ///
    /// Consensus requires a unique top bucket holding strictly more than half
    /// of the valid responses and a mean confidence at or above the threshold.
    pub fn vote(&self, outputs: &[ToolOutput]) -> VoteOutcome {
        let valid: Vec<_> = outputs.iter().filter_map(|o| o.response.as_ref()).collect();

        if valid.is_empty() {
            return VoteOutcome {
                is_consensus: false,
                majority_decision: None,
                confidence: 0.0,
                vote_distribution: BTreeMap::from([(NO_RESPONSE.to_string(), outputs.len())]),
                raw_responses: outputs.to_vec(),
            };
        }

        let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
        let mut first_seen: Vec<String> = Vec::new();
        let mut total_confidence = 0.0;
        for response in &valid {
            let decision = response.normalized_decision();
            if !distribution.contains_key(&decision) {
                first_seen.push(decision.clone());
            }
            *distribution.entry(decision).or_insert(0) += 1;
            total_confidence += response.confidence;
        }

        let max_votes = distribution.values().copied().max().unwrap_or(0);
        let majority = first_seen.into_iter().find(|d| distribution.get(d) == Some(&max_votes));
        let has_tie = distribution.values().filter(|&&v| v == max_votes).count() > 1;
        let confidence = total_confidence / valid.len() as f64;

        let is_consensus = !has_tie
            && majority.is_some()
            && max_votes * 2 > valid.len()
            && confidence >= self.threshold;

        VoteOutcome {
            is_consensus,
            majority_decision: majority,
            confidence,
            vote_distribution: distribution,
            raw_responses: outputs.to_vec(),
        }
    }
}

/// Votes with the default threshold.
pub fn vote(outputs: &[ToolOutput]) -> VoteOutcome {
    MajorityVote::default().vote(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ada_abstraction::VotableResponse;
    use serde_json::Value;

    fn output(decision: &str, confidence: f64) -> ToolOutput {
        ToolOutput::new(
            "tool",
            "provider",
            Some(VotableResponse::new(decision, "because", confidence)),
            Value::Null,
        )
    }

    fn silent() -> ToolOutput {
        ToolOutput::new("tool", "provider", None, Value::Null)
    }

    #[test]
    fn test_empty_input() {
        let outcome = vote(&[]);
        assert!(!outcome.is_consensus);
        assert_eq!(outcome.majority_decision, None);
        assert_eq!(outcome.vote_distribution.values().sum::<usize>(), 0);
    }

    #[test]
    fn test_all_null_responses() {
        let outcome = vote(&[silent(), silent(), silent()]);
        assert!(!outcome.is_consensus);
        assert_eq!(outcome.vote_distribution, BTreeMap::from([(NO_RESPONSE.to_string(), 3)]));
        assert_eq!(outcome.raw_responses.len(), 3);
        assert!(outcome.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn test_strict_majority_with_confidence() {
        let outcome = vote(&[output(" Confirm", 0.9), output("confirm ", 0.8), output("reject", 0.7)]);
        assert!(outcome.is_consensus);
        assert_eq!(outcome.majority_decision.as_deref(), Some("confirm"));
        assert!(outcome.confirms("CONFIRM"));
        assert_eq!(outcome.vote_distribution["confirm"], 2);
        assert!((outcome.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_tie_is_never_consensus() {
        let outcome = vote(&[
            output("confirm", 1.0),
            output("confirm", 1.0),
            output("reject", 1.0),
            output("reject", 1.0),
        ]);
        assert!(!outcome.is_consensus);
        assert!(outcome.is_tie());
        assert_eq!(outcome.majority_decision.as_deref(), Some("confirm"));
        assert_eq!(outcome.distribution_label(), "confirm: 2, reject: 2");
    }

    #[test]
    fn test_plurality_without_majority_fails() {
        let outcome = vote(&[
            output("confirm", 0.9),
            output("confirm", 0.9),
            output("reject", 0.9),
            output("defer", 0.9),
        ]);
        assert!(!outcome.is_tie());
        assert!(!outcome.is_consensus);
    }

    #[test]
    fn test_low_confidence_blocks_consensus() {
        let outcome = vote(&[output("confirm", 0.6), output("confirm", 0.6)]);
        assert!(!outcome.is_consensus);
        assert_eq!(outcome.majority_decision.as_deref(), Some("confirm"));

        let lenient = MajorityVote::new(0.5).vote(&outcome.raw_responses);
        assert!(lenient.is_consensus);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(vote(&[output("confirm", 0.7), output("confirm", 0.7)]).is_consensus);
    }

    #[test]
    fn test_null_responses_are_filtered() {
        let outcome = vote(&[output("confirm", 0.9), silent(), silent()]);
        assert!(outcome.is_consensus);
        assert_eq!(outcome.vote_distribution.len(), 1);
        assert_eq!(outcome.raw_responses.len(), 3);
    }

    #[test]
    fn test_is_deterministic() {
        let outputs = [output("reject", 0.8), output("confirm", 0.9), output("confirm", 0.75)];
        assert_eq!(vote(&outputs), vote(&outputs));
    }
}
