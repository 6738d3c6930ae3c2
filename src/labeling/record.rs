use serde::{Deserialize, Serialize};

/// Polarity of a weak supervision label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Positive,
    Negative,
}

impl Label {
    /// Signed value written to the training data (+1 / -1)
    pub fn value(self) -> i8 {
        match self {
            Label::Positive => 1,
            Label::Negative => -1,
        }
    }
}

/// Represents a single weak label emitted for a candidate mention pair.
///
/// `rule_id` names the rule that fired, for downstream error analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub entity1_id: String,
    pub entity2_id: String,
    pub label: Label,
    pub rule_id: String,
}

impl LabelRecord {
    pub fn new(entity1_id: &str, entity2_id: &str, label: Label, rule_id: &str) -> Self {
        Self {
            entity1_id: entity1_id.to_string(),
            entity2_id: entity2_id.to_string(),
            label,
            rule_id: rule_id.to_string(),
        }
    }

    /// Render the record as a harness output line: id, id, signed label, rule
    pub fn to_tsv(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.entity1_id,
            self.entity2_id,
            self.label.value(),
            self.rule_id
        )
    }
}
