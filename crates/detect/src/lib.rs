pub mod amplify;
pub mod cluster;
pub mod debug;
pub mod extract;
pub mod locator;

pub use amplify::{amplify, dilate_rect};
pub use cluster::cluster_rows;
pub use debug::DebugSink;
pub use extract::extract_boxes;
pub use locator::{CellLocator, FixedLayout, GridLocator, NamedRegion};
