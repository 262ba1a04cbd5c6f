//! SVG export serializers.
//!
//! Two outputs:
//!
//! - [`to_boundary_svg`] draws the final physical boundary as one
//!   closed `<path>`, built with the [`svg`] crate. The y axis is
//!   flipped so the drawing is upright (physical y points up).
//! - [`to_diagnostic_svg`] overlays every geometric stage on the
//!   raster's pixel grid: the dominant contour, the approximated
//!   polygon, the three reference pixels and the ordered boundary with
//!   each point numbered in traversal order.
//!
//! Optional [`SvgMetadata`] embeds `<title>`, `<desc>` and the
//! serialized pipeline configuration.
//!
//! These are pure functions with no I/O -- they return a `String`.

use std::fmt::Write;

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Group, Path, Title};
use svg::node::{Node, Text};

use wedgemesh_pipeline::scale::ScaleConfig;
use wedgemesh_pipeline::{
    Dimensions, PhysicalScaler, PipelineError, PixelPoint, Point, ReferencePixels, StagedResult,
};

/// Namespace of the `<wedgemesh:pipeline>` metadata element.
const METADATA_NAMESPACE: &str = "urn:wedgemesh:pipeline:1";

/// Margin around the boundary drawing, as a fraction of its larger
/// extent.
const BOUNDARY_MARGIN: f64 = 0.05;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. Text is XML-escaped on output.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source archive name and field key.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized [`PipelineConfig`](wedgemesh_pipeline::PipelineConfig)
    /// JSON, emitted inside `<metadata>` so a diagnostic can be
    /// reproduced.
    pub config_json: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Boundary SVG (uses `svg` crate)
// ---------------------------------------------------------------------------

/// Serialize an ordered physical boundary as a closed SVG path.
///
/// The `viewBox` spans the points' bounding box plus a small margin.
/// An empty or single-point list produces a document with no path.
#[must_use]
pub fn to_boundary_svg(points: &[Point], metadata: &SvgMetadata<'_>) -> String {
    let (min_x, min_y, max_x, max_y) = bounds(points).unwrap_or((0.0, 0.0, 1.0, 1.0));
    let margin = BOUNDARY_MARGIN * (max_x - min_x).max(max_y - min_y).max(f64::EPSILON);
    let width = 2.0f64.mul_add(margin, max_x - min_x);
    let height = 2.0f64.mul_add(margin, max_y - min_y);

    // With y flipped, the box's top edge sits at -(max_y + margin).
    let mut doc = Document::new().set(
        "viewBox",
        (min_x - margin, -(max_y + margin), width, height),
    );

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }
    if let Some(config_json) = metadata.config_json {
        let mut pipeline_el = Element::new("wedgemesh:pipeline");
        pipeline_el.assign("xmlns:wedgemesh", METADATA_NAMESPACE);
        pipeline_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(pipeline_el);
        doc = doc.add(metadata_el);
    }

    if points.len() >= 2 {
        let mut data = Data::new().move_to((points[0].x, points[0].y));
        for p in &points[1..] {
            data = data.line_to((p.x, p.y));
        }
        let path = Path::new()
            .set("d", data.close())
            .set("fill", "none")
            .set("stroke", "black")
            .set("stroke-width", 1)
            .set("vector-effect", "non-scaling-stroke");
        doc = doc.add(Group::new().set("transform", "scale(1,-1)").add(path));
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

fn bounds(points: &[Point]) -> Option<(f64, f64, f64, f64)> {
    let first = points.first()?;
    Some(points.iter().fold(
        (first.x, first.y, first.x, first.y),
        |(min_x, min_y, max_x, max_y), p| {
            (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
        },
    ))
}

// ---------------------------------------------------------------------------
// Diagnostic SVG (manual string formatting)
// ---------------------------------------------------------------------------

/// Pixel-space geometry for [`to_diagnostic_svg`].
#[derive(Debug, Clone)]
pub struct DiagnosticOverlay<'a> {
    /// Raster size; sets the SVG `viewBox`.
    pub dimensions: Dimensions,
    /// Dominant contour, drawn closed.
    pub contour: &'a [PixelPoint],
    /// Approximated polygon, drawn closed.
    pub approximated: &'a [PixelPoint],
    /// Reference pixels, drawn as labelled markers.
    pub references: ReferencePixels,
    /// Final ordered boundary mapped back to pixel coordinates.
    pub ordered: Vec<Point>,
}

impl<'a> DiagnosticOverlay<'a> {
    /// Collect the overlay from a staged run.
    ///
    /// The ordered physical points are mapped back through the inverse
    /// of the transform built from `scale`, which must be the scale
    /// configuration the run used.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DegenerateScale`] if the reference
    /// pixels cannot define a transform (never the case for a
    /// successful run with the same `scale`).
    pub fn from_staged(
        staged: &'a StagedResult,
        scale: &ScaleConfig,
    ) -> Result<Self, PipelineError> {
        let scaler = PhysicalScaler::new(&staged.references, scale)?;
        Ok(Self {
            dimensions: staged.dimensions,
            contour: staged.contour.points(),
            approximated: &staged.approximated,
            references: staged.references,
            ordered: staged
                .ordered
                .points()
                .iter()
                .map(|&p| scaler.to_pixel(p))
                .collect(),
        })
    }
}

/// Escape the five XML special characters for safe embedding in element
/// text content and attribute values.
fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Write the XML declaration, opening `<svg>` tag and optional
/// `<title>`, `<desc>` and `<metadata>` elements.
fn write_svg_preamble(out: &mut String, dimensions: Dimensions, metadata: &SvgMetadata<'_>) {
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        dimensions.width, dimensions.height, dimensions.width, dimensions.height,
    );

    if let Some(title) = metadata.title {
        let _ = writeln!(out, "  <title>{}</title>", xml_escape(title));
    }
    if let Some(description) = metadata.description {
        let _ = writeln!(out, "  <desc>{}</desc>", xml_escape(description));
    }
    if let Some(config_json) = metadata.config_json {
        let _ = writeln!(out, "  <metadata>");
        let _ = writeln!(
            out,
            "    <wedgemesh:pipeline xmlns:wedgemesh=\"{METADATA_NAMESPACE}\">{}</wedgemesh:pipeline>",
            xml_escape(config_json),
        );
        let _ = writeln!(out, "  </metadata>");
    }
}

/// Closed-path `d` attribute for pixel points, or `None` below two
/// points. Coordinates sit at pixel centres.
fn closed_pixel_path(points: &[PixelPoint]) -> Option<String> {
    if points.len() < 2 {
        return None;
    }
    let mut d = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let cmd = if i == 0 { "M" } else { "L" };
            format!("{cmd} {:.1} {:.1}", f64::from(p.x) + 0.5, f64::from(p.y) + 0.5)
        })
        .collect::<Vec<_>>()
        .join(" ");
    d.push_str(" Z");
    Some(d)
}

/// Serialize the staged geometry into a diagnostic SVG.
///
/// Layers, bottom to top, each in its own `<g>`:
///
/// | id | Content |
/// |---|---|
/// | `contour` | dominant contour, white |
/// | `approximated` | approximated polygon, cyan |
/// | `references` | reference pixels, red circles with labels |
/// | `ordered` | ordered boundary, yellow, points numbered from 1 |
///
/// The ordered points carry a `data-index` attribute (1-based) so the
/// traversal order can be checked programmatically.
#[must_use]
pub fn to_diagnostic_svg(overlay: &DiagnosticOverlay<'_>, metadata: &SvgMetadata<'_>) -> String {
    let mut out = String::new();
    let dimensions = overlay.dimensions;
    let marker = f64::from(dimensions.width.max(dimensions.height)).mul_add(1.0 / 150.0, 1.0);

    write_svg_preamble(&mut out, dimensions, metadata);

    // Dark background for visibility
    let _ = writeln!(
        out,
        "  <rect width=\"{}\" height=\"{}\" fill=\"#1a1a1a\"/>",
        dimensions.width, dimensions.height,
    );

    let _ = writeln!(
        out,
        r#"  <g id="contour" stroke="white" stroke-width="1" fill="none">"#
    );
    if let Some(d) = closed_pixel_path(overlay.contour) {
        let _ = writeln!(out, r#"    <path d="{d}" data-points="{}"/>"#, overlay.contour.len());
    }
    let _ = writeln!(out, "  </g>");

    let _ = writeln!(
        out,
        r#"  <g id="approximated" stroke="cyan" stroke-width="1.5" fill="none">"#
    );
    if let Some(d) = closed_pixel_path(overlay.approximated) {
        let _ = writeln!(
            out,
            r#"    <path d="{d}" data-points="{}"/>"#,
            overlay.approximated.len()
        );
    }
    let _ = writeln!(out, "  </g>");

    let references = overlay.references;
    let _ = writeln!(
        out,
        r#"  <g id="references" fill="none" stroke="red" stroke-width="1.5">"#
    );
    for (name, p) in [
        ("left-upper", references.left_upper),
        ("left-lower", references.left_lower),
        ("right-lower", references.right_lower),
    ] {
        let (cx, cy) = (f64::from(p.x) + 0.5, f64::from(p.y) + 0.5);
        let _ = writeln!(
            out,
            r#"    <circle cx="{cx:.1}" cy="{cy:.1}" r="{:.1}" data-name="{name}"/>"#,
            marker * 1.5,
        );
        let _ = writeln!(
            out,
            r#"    <text x="{:.1}" y="{:.1}" fill="red" stroke="none" font-size="{:.1}">{name}</text>"#,
            marker.mul_add(2.0, cx),
            marker.mul_add(-2.0, cy),
            marker * 3.0,
        );
    }
    let _ = writeln!(out, "  </g>");

    let _ = writeln!(
        out,
        r#"  <!-- Ordered boundary: {} points -->"#,
        overlay.ordered.len()
    );
    let _ = writeln!(out, r#"  <g id="ordered" stroke="yellow" fill="yellow">"#);
    if overlay.ordered.len() >= 2 {
        let d = overlay
            .ordered
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let cmd = if i == 0 { "M" } else { "L" };
                format!("{cmd} {:.1} {:.1}", p.x + 0.5, p.y + 0.5)
            })
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            out,
            r#"    <path d="{d} Z" fill="none" stroke-width="1" stroke-dasharray="4 2"/>"#
        );
    }
    for (i, p) in overlay.ordered.iter().enumerate() {
        let (cx, cy) = (p.x + 0.5, p.y + 0.5);
        let _ = writeln!(
            out,
            r#"    <circle cx="{cx:.1}" cy="{cy:.1}" r="{marker:.1}" data-index="{}"/>"#,
            i + 1,
        );
        let _ = writeln!(
            out,
            r#"    <text x="{:.1}" y="{:.1}" stroke="none" font-size="{:.1}">{}</text>"#,
            marker.mul_add(1.5, cx),
            marker.mul_add(3.5, cy),
            marker * 3.0,
            i + 1,
        );
    }
    let _ = writeln!(out, "  </g>");

    let _ = writeln!(out, "</svg>");
    out
}
