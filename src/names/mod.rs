pub mod disambiguator;

pub use disambiguator::{Disambiguator, KeepLongNames, TruncateLongNames, TruncationPolicy};
