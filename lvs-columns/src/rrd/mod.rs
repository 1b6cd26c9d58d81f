//! Round-robin database backed metric history columns.

mod args;
mod column;
mod data_maker;
mod renderer;
pub mod rpn;
mod store;

pub use self::args::RrdColumnArgs;
pub use self::column::{HostRrdColumn, RrdColumn, RrdLeafColumn, ServiceRrdColumn};
pub use self::data_maker::{RrdData, RrdDataMaker};
pub use self::renderer::{Renderer, RrdRenderer};
pub use self::store::{ArchiveOptions, RoundRobinArchive};
