//! SVG document building from a [`FrameGeometry`].
//!
//! One `<line>` per glyph, one `<polyline>` per streamline or particle
//! trail, one `<circle>` per particle that has no trail yet. Source markers
//! (a `<circle>` plus a `<text>` label) follow in their own group.

use flowfield_core::field_source::{SingularitySource, SourceKind};
use flowfield_core::geometry::{FrameGeometry, Glyph, ParticleMark, Polyline, Shapes};
use flowfield_core::DVec2;

/// Glyphs below this opacity would vanish on most backgrounds.
const MIN_GLYPH_OPACITY: f64 = 0.25;

/// Presentation settings for [`to_svg`].
#[derive(Debug, Clone, PartialEq)]
pub struct SvgStyle {
    /// Any CSS colour; `None` leaves the background transparent.
    pub background: Option<String>,
    pub stroke: String,
    pub stroke_width: f64,
    pub particle_radius: f64,
    pub source_radius: f64,
    /// Draw each source's name next to its marker.
    pub label_sources: bool,
    /// Decimal places written for coordinates.
    pub precision: usize,
}

impl Default for SvgStyle {
    fn default() -> Self {
        Self {
            background: Some("#0b0d12".to_string()),
            stroke: "#e8eef7".to_string(),
            stroke_width: 1.0,
            particle_radius: 1.5,
            source_radius: 6.0,
            label_sources: true,
            precision: 2,
        }
    }
}

/// Marker colour for a source kind.
pub fn kind_color(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Vortex => "#7aa2f7",
        SourceKind::Source => "#9ece6a",
        SourceKind::Sink => "#f7768e",
        SourceKind::Uniform => "#e0af68",
    }
}

/// Renders `frame` as a standalone SVG document.
pub fn to_svg(frame: &FrameGeometry, style: &SvgStyle) -> String {
    let p = style.precision;
    let min = frame.bounds.min();
    let (w, h) = (frame.bounds.width(), frame.bounds.height());

    let mut out = String::new();
    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w:.p$}\" height=\"{h:.p$}\" \
         viewBox=\"{:.p$} {:.p$} {w:.p$} {h:.p$}\">\n",
        min.x, min.y
    ));
    if let Some(bg) = &style.background {
        out.push_str(&format!(
            "<rect x=\"{:.p$}\" y=\"{:.p$}\" width=\"{w:.p$}\" height=\"{h:.p$}\" fill=\"{}\"/>\n",
            min.x,
            min.y,
            escape(bg)
        ));
    }

    out.push_str(&format!(
        "<g class=\"{}\" stroke=\"{}\" stroke-width=\"{:.p$}\" fill=\"none\" \
         stroke-linecap=\"round\" stroke-linejoin=\"round\">\n",
        frame.shapes.mode().name(),
        escape(&style.stroke),
        style.stroke_width
    ));
    match &frame.shapes {
        Shapes::Glyphs(glyphs) => write_glyphs(&mut out, glyphs, p),
        Shapes::Streamlines(lines) => {
            for line in lines.iter().filter(|l| l.len() > 1) {
                write_polyline(&mut out, &line.points, None, p);
            }
        }
        Shapes::Particles(marks) => write_particles(&mut out, marks, style),
    }
    out.push_str("</g>\n");

    if !frame.sources.is_empty() {
        write_sources(&mut out, &frame.sources, style);
    }
    out.push_str("</svg>\n");
    out
}

fn write_glyphs(out: &mut String, glyphs: &[Glyph], p: usize) {
    let max = glyphs.iter().map(|g| g.magnitude).fold(0.0_f64, f64::max);
    for g in glyphs {
        let opacity = if max > 0.0 && g.magnitude.is_finite() {
            MIN_GLYPH_OPACITY + (1.0 - MIN_GLYPH_OPACITY) * (g.magnitude / max)
        } else {
            1.0
        };
        out.push_str(&format!(
            "<line x1=\"{:.p$}\" y1=\"{:.p$}\" x2=\"{:.p$}\" y2=\"{:.p$}\" stroke-opacity=\"{opacity:.3}\"/>\n",
            g.origin.x, g.origin.y, g.end.x, g.end.y
        ));
    }
}

fn write_particles(out: &mut String, marks: &[ParticleMark], style: &SvgStyle) {
    let p = style.precision;
    for mark in marks {
        if mark.trail.is_empty() {
            out.push_str(&format!(
                "<circle cx=\"{:.p$}\" cy=\"{:.p$}\" r=\"{:.p$}\" fill=\"{}\" stroke=\"none\"/>\n",
                mark.position.x,
                mark.position.y,
                style.particle_radius,
                escape(&style.stroke)
            ));
        } else {
            write_polyline(out, &mark.trail, Some(mark.position), p);
        }
    }
}

fn write_polyline(out: &mut String, points: &[DVec2], head: Option<DVec2>, p: usize) {
    let coords: Vec<String> = points
        .iter()
        .chain(head.as_ref())
        .map(|pt| format!("{:.p$},{:.p$}", pt.x, pt.y))
        .collect();
    out.push_str(&format!("<polyline points=\"{}\"/>\n", coords.join(" ")));
}

fn write_sources(out: &mut String, sources: &[SingularitySource], style: &SvgStyle) {
    let p = style.precision;
    out.push_str("<g class=\"sources\" font-family=\"sans-serif\" font-size=\"10\">\n");
    for s in sources {
        let color = kind_color(s.kind);
        out.push_str(&format!(
            "<circle cx=\"{:.p$}\" cy=\"{:.p$}\" r=\"{:.p$}\" fill=\"{color}\" fill-opacity=\"0.6\" stroke=\"{color}\" data-type=\"{}\" data-id=\"{}\"/>\n",
            s.x,
            s.y,
            style.source_radius,
            s.kind.name(),
            escape(&s.id)
        ));
        if style.label_sources {
            out.push_str(&format!(
                "<text x=\"{:.p$}\" y=\"{:.p$}\" fill=\"{color}\">{}</text>\n",
                s.x + style.source_radius + 2.0,
                s.y - style.source_radius,
                escape(&s.name)
            ));
        }
    }
    out.push_str("</g>\n");
}

/// Escapes the five XML special characters.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Every shape in the frame as a bare polyline: glyphs become two-point
/// segments, particles their trail followed by the head.
pub fn polylines(frame: &FrameGeometry) -> Vec<Polyline> {
    match &frame.shapes {
        Shapes::Glyphs(glyphs) => glyphs
            .iter()
            .map(|g| Polyline::new(vec![g.origin, g.end]))
            .collect(),
        Shapes::Streamlines(lines) => lines.clone(),
        Shapes::Particles(marks) => marks
            .iter()
            .map(|m| {
                let mut points = m.trail.clone();
                points.push(m.position);
                Polyline::new(points)
            })
            .collect(),
    }
}
