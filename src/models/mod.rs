pub mod raw_file;
pub mod resolution;
pub mod work_map;

pub use raw_file::{is_sidecar, RawFile, RenderedCandidate};
pub use resolution::Resolution;
pub use work_map::PendingWorkMap;
