pub mod record;
pub mod rules;

pub use record::{Label, LabelRecord};
pub use rules::{label_candidate, label_row};
