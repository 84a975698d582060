#![deny(unsafe_code)]
//! Export of renderer-agnostic frame geometry.
//!
//! [`svg`] turns a [`FrameGeometry`](flowfield_core::FrameGeometry) into an
//! SVG document in memory; [`snapshot`] writes SVG or JSON files to disk.

pub mod snapshot;
pub mod svg;

pub use snapshot::{write_json, write_svg};
pub use svg::{polylines, to_svg, SvgStyle};
