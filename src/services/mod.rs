pub mod file_remover;
pub mod ledger;
pub mod resolution_probe;

pub use file_remover::FileRemover;
pub use ledger::Ledger;
pub use resolution_probe::ResolutionProbe;
