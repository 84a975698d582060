//! File output for frame geometry.

use std::fs;
use std::path::Path;

use flowfield_core::error::EngineError;
use flowfield_core::geometry::FrameGeometry;
use serde_json::json;

use crate::svg::{polylines, to_svg, SvgStyle};

/// Writes `frame` as an SVG document.
///
/// Returns `EngineError::Io` on write failure.
pub fn write_svg(frame: &FrameGeometry, style: &SvgStyle, path: &Path) -> Result<(), EngineError> {
    fs::write(path, to_svg(frame, style))?;
    log::debug!("wrote {} shapes to {}", frame.shapes.len(), path.display());
    Ok(())
}

/// Writes `frame` as pretty-printed JSON: the full geometry plus a flat
/// `polylines` list of `[x, y]` pairs for tools that only want lines.
///
/// Returns `EngineError::Io` on write failure.
pub fn write_json(frame: &FrameGeometry, path: &Path) -> Result<(), EngineError> {
    let flat: Vec<Vec<[f64; 2]>> = polylines(frame)
        .iter()
        .map(|line| line.points.iter().map(|p| [p.x, p.y]).collect())
        .collect();
    let doc = json!({
        "frame": serde_json::to_value(frame)?,
        "polylines": flat,
    });
    fs::write(path, serde_json::to_string_pretty(&doc)?)?;
    log::debug!("wrote {} polylines to {}", flat.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowfield_core::bounds::Bounds;
    use flowfield_core::geometry::{Polyline, Shapes};
    use flowfield_core::DVec2;

    fn frame() -> FrameGeometry {
        FrameGeometry {
            bounds: Bounds::from_size(64.0, 64.0).unwrap(),
            time: 1.5,
            shapes: Shapes::Streamlines(vec![Polyline::new(vec![
                DVec2::new(1.0, 2.0),
                DVec2::new(3.0, 4.0),
            ])]),
            sources: Vec::new(),
        }
    }

    #[test]
    fn write_svg_creates_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.svg");

        write_svg(&frame(), &SvgStyle::default(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("<svg"));
        assert!(text.contains("<polyline points=\"1.00,2.00 3.00,4.00\"/>"));
    }

    #[test]
    fn write_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.json");

        write_json(&frame(), &path).unwrap();

        let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["polylines"][0][1][0], 3.0);
        let back: FrameGeometry = serde_json::from_value(v["frame"].clone()).unwrap();
        assert_eq!(back, frame());
    }

    #[test]
    fn write_into_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("frame.svg");
        let err = write_svg(&frame(), &SvgStyle::default(), &path).unwrap_err();
        assert!(matches!(err, EngineError::Io(_)), "got {err:?}");
    }
}
