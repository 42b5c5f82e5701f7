//! Route generation pipeline for the traffic-flow layer.
//!
//! Data flows leaf-first: raw host nodes are projected and optionally folded
//! into country centroids ([`aggregate`]), a weighted random route set is drawn
//! and ranked ([`routes`]), a density prefix is selected ([`filter`]) and the
//! survivors are expanded into GPU-ready vertex records ([`geometry`]).

pub mod aggregate;
pub mod filter;
pub mod geometry;
pub mod node;
pub mod routes;
pub mod sampling;
pub mod tiers;

pub use aggregate::*;
pub use filter::*;
pub use geometry::*;
pub use node::*;
pub use routes::*;
pub use sampling::*;
pub use tiers::*;
