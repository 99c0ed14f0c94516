pub mod directory_matcher;
pub mod verdict;

pub use directory_matcher::DirectoryMatcher;
pub use verdict::Verdict;
