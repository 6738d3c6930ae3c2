pub mod data;
pub mod labeling;
pub mod tally;

pub use data::{CandidateRow, Mention, SentenceAnnotations, TokenSpan};
pub use labeling::{label_candidate, label_row, Label, LabelRecord};
pub use tally::{tally_file, tally_reader, tally_rows, OutcomeCounts, TallyError, TallyTable};
