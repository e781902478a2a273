mod adapter;
mod backend;
mod backends;
pub mod postprocess;
mod result;

pub use adapter::InferenceAdapter;
pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use result::{filter_by_confidence, BoundingBox, Detection};
