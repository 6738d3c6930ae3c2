pub mod mention;
pub mod parser;
pub mod sentence;

pub use mention::{Mention, TokenSpan};
pub use parser::{open_maybe_gzip, CandidateRow, ParseError};
pub use sentence::SentenceAnnotations;
