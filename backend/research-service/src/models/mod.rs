/// Data models for researchers, sessions, and research records
pub mod dataset;
pub mod patient;
pub mod researcher;
pub mod token_pair;

pub use dataset::{Dataset, DatasetKind, DatasetKindCount};
pub use patient::Patient;
pub use researcher::{NewResearcher, Researcher};
pub use token_pair::{NewTokenPair, TokenPair};
