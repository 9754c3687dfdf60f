pub mod core;
pub mod error;
pub mod params;
pub mod sources;
pub mod collision;
pub mod orient;
pub mod placement;
pub mod group;
