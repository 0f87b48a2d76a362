pub mod cells;
pub mod dates;
pub mod patterns;
pub mod scanners;

pub use cells::{apa_cell, apa_nominal_round, apa_rounds, swiss_cell};
pub use dates::{iso, DateToken};
pub use scanners::{
    day_name, default_marker, is_board, is_number, score_word, split_codes, words, DefaultMarker, Matcher, Word,
};
