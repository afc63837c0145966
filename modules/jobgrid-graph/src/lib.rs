pub mod maintainer;
pub mod membership;
pub mod projection;
pub mod reader;
pub mod tags;

pub use maintainer::{CompanyPatch, GraphMaintainer, JobPatch, PostPatch, ProfilePatch};
pub use membership::SetEdge;
pub use projection::Projector;
pub use reader::GraphReader;
pub use tags::TagTarget;
