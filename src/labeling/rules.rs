//! Heuristic rules for finding positive and negative examples of coworker
//! relationship mentions.
//!
//! Each rule is a pure set-membership test over two windows derived from the
//! candidate's mention spans: the `intermediate` window (tokens strictly
//! between the two mentions) and the `tail` window (tokens after both
//! mentions, to end of sentence). Rules are independent; a single candidate
//! can receive several labels.

use crate::data::{CandidateRow, Mention, SentenceAnnotations};

use super::record::{Label, LabelRecord};

/// Lemmas naming the senior side of a reporting relationship
const SUPERVISORS: &[&str] = &["boss", "supervisor", "manager"];

/// Lemmas naming the junior side of a reporting relationship
const SUBORDINATES: &[&str] = &["subordinate", "staff"];

/// Lemmas naming a peer working relationship
const PEERS: &[&str] = &["colleague", "coworker"];

/// Mention pairs separated by more lemmas than this are assumed unrelated
const MAX_DIST: usize = 15;

pub const RULE_BOSS_AND_SUBORDINATE: &str = "pos:boss_and_subordinate";
pub const RULE_COLLEAGUES: &str = "pos:colleagues";
pub const RULE_WORK_TOGETHER: &str = "pos:work_together";
pub const RULE_FAR_APART: &str = "neg:far_apart";
pub const RULE_FROM_DIFFERENT_ORGS: &str = "neg:from_different_orgs";

/// The derived windows a labeling call evaluates its rules against
struct Windows<'a> {
    intermediate_lemmas: &'a [String],
    intermediate_ner_tags: &'a [String],
    tail_lemmas: &'a [String],
}

impl<'a> Windows<'a> {
    /// Compute both windows from the mention spans.
    ///
    /// The intermediate window runs strictly between the earlier mention's
    /// end and the later mention's start, so it is symmetric in which mention
    /// is passed first. Offsets beyond the sentence clamp to empty windows.
    fn new(p1: &Mention, p2: &Mention, sentence: &'a SentenceAnnotations) -> Self {
        let inner_end = p1.span.end.min(p2.span.end);
        let inner_start = p1.span.begin.max(p2.span.begin);
        let outer_end = p1.span.end.max(p2.span.end);

        Self {
            intermediate_lemmas: between(&sentence.lemmas, inner_end, inner_start),
            intermediate_ner_tags: between(&sentence.ner_tags, inner_end, inner_start),
            tail_lemmas: after(&sentence.lemmas, outer_end),
        }
    }
}

/// Tokens strictly between `end` and `start`, clamped to the array bounds
fn between(items: &[String], end: usize, start: usize) -> &[String] {
    let lo = (end + 1).min(items.len());
    let hi = start.min(items.len());
    if lo < hi {
        &items[lo..hi]
    } else {
        &[]
    }
}

/// Tokens strictly after `end`, to the end of the array
fn after(items: &[String], end: usize) -> &[String] {
    let lo = (end + 1).min(items.len());
    &items[lo..]
}

fn contains(haystack: &[String], needle: &str) -> bool {
    haystack.iter().any(|item| item == needle)
}

fn contains_any(haystack: &[String], needles: &[&str]) -> bool {
    haystack.iter().any(|item| needles.contains(&item.as_str()))
}

/// Apply every labeling rule to one candidate mention pair.
///
/// Returns the emitted records in rule evaluation order. The call is pure
/// and recomputes everything from scratch, so identical inputs always yield
/// identical output sequences.
pub fn label_candidate(
    p1: &Mention,
    p2: &Mention,
    sentence: &SentenceAnnotations,
) -> Vec<LabelRecord> {
    let windows = Windows::new(p1, p2, sentence);
    let emit = |label, rule_id| LabelRecord::new(&p1.id, &p2.id, label, rule_id);
    let mut records = Vec::new();

    // Rule: a supervision word between the mentions
    if contains_any(windows.intermediate_lemmas, SUPERVISORS)
        || contains_any(windows.intermediate_lemmas, SUBORDINATES)
    {
        records.push(emit(Label::Positive, RULE_BOSS_AND_SUBORDINATE));
    }

    // Rule: a peer word between the mentions
    if contains_any(windows.intermediate_lemmas, PEERS) {
        records.push(emit(Label::Positive, RULE_COLLEAGUES));
    }

    // Rule: "<P1> and <P2> ... work ..."
    if contains(windows.intermediate_lemmas, "and") && contains(windows.tail_lemmas, "work") {
        records.push(emit(Label::Positive, RULE_WORK_TOGETHER));
    }

    // Rule: candidates that are too far apart
    if windows.intermediate_lemmas.len() > MAX_DIST {
        records.push(emit(Label::Negative, RULE_FAR_APART));
    }

    // Rule: an organization between the mentions and another after them.
    // The tail side matches the literal lemma "ORGANIZATION", not the NER
    // tag. Known quirk of this rule set, kept as-is; see DESIGN.md.
    if contains(windows.intermediate_ner_tags, "ORGANIZATION")
        && contains(windows.tail_lemmas, "ORGANIZATION")
    {
        records.push(emit(Label::Negative, RULE_FROM_DIFFERENT_ORGS));
    }

    records
}

/// Label a full harness row: build the mentions and apply the rules
pub fn label_row(row: &CandidateRow) -> Vec<LabelRecord> {
    let (p1, p2) = row.mentions();
    label_candidate(&p1, &p2, &row.sentence)
}
