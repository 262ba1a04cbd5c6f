//! Integration tests: run synthetic fields through the full pipeline.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::float_cmp,
    clippy::cast_precision_loss
)]

use approx::assert_abs_diff_eq;
use ndarray::Array2;
use wedgemesh_pipeline::approximate::{self, ApproximationConfig};
use wedgemesh_pipeline::mask::{self, MaskConfig};
use wedgemesh_pipeline::render::{self, Colormap};
use wedgemesh_pipeline::scale::ScaleConfig;
use wedgemesh_pipeline::types::Axis;
use wedgemesh_pipeline::{
    CornerPolicy, LowerWallPolicy, MemoryArchive, MeshBuilder, MeshTopology, NormalizeConfig,
    PhysicalScaler, PipelineConfig, PipelineError, PixelPoint, Point, ReferencePolicy,
    ReferenceSource, ScalarField, build_boundary_mesh,
};

/// A field that is 0 where `inside(x, y)` holds and 1 elsewhere.
fn field(width: usize, height: usize, inside: impl Fn(usize, usize) -> bool) -> ScalarField {
    let values = Array2::from_shape_fn((height, width), |(y, x)| {
        if inside(x, y) { 0.0 } else { 1.0 }
    });
    ScalarField::new("density", values).unwrap()
}

/// 60 x 40 field with a dark block covering columns 10..=49, rows 10..=29.
fn block_field() -> ScalarField {
    field(60, 40, |x, y| (10..=49).contains(&x) && (10..=29).contains(&y))
}

/// Configuration that leaves an axis-aligned block's corners untouched.
fn plain_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.colormap = Colormap::Grayscale;
    config.mask = MaskConfig {
        median_radius: 0,
        gaussian_sigma: 0.0,
        threshold: 128,
    };
    config.approximation = ApproximationConfig {
        align_left_wall: false,
        corner_policy: CornerPolicy::Keep,
        ..ApproximationConfig::default()
    };
    config.normalize = NormalizeConfig {
        target_count: 4,
        lower_wall: LowerWallPolicy::Omit,
    };
    config.references.source = ReferenceSource::Mask;
    config
}

/// 400 x 200 field laid out like a double-ramp channel: the solid
/// (value 0) fills the top of the image down to a wall made of an inlet
/// flat, a shallow ramp, a flat, a steeper ramp and an outlet flat.
/// Below the wall is fluid down to the bottom row.
fn double_ramp_field() -> ScalarField {
    field(400, 200, |x, y| {
        let x = x as f64;
        let first = (x - 100.0).clamp(0.0, 80.0) * 0.3;
        let second = (x - 240.0).clamp(0.0, 60.0) * 0.5;
        (y as f64) <= 40.0 + first + second
    })
}

/// Counts the entities a mesh definition emits.
#[derive(Default)]
struct LineCounter {
    points: usize,
    lines: usize,
}

impl MeshBuilder for LineCounter {
    fn add_point(&mut self, _tag: usize, _point: Point) {
        self.points += 1;
    }
    fn add_line(&mut self, _tag: usize, _start: usize, _end: usize) {
        self.lines += 1;
    }
    fn add_curve_loop(&mut self, _tag: usize, _curves: &[usize]) {}
    fn add_plane_surface(&mut self, _tag: usize, _curve_loop: usize) {}
    fn add_physical_curve(&mut self, _tag: usize, _name: &str, _curves: &[usize]) {}
    fn set_transfinite_curve(&mut self, _curve: usize, _nodes: u32) {}
    fn set_transfinite_surface(&mut self, _surface: usize, _corners: [usize; 4]) {}
    fn set_recombine(&mut self, _surface: usize) {}
    fn set_mesh_option(&mut self, _name: &str, _value: f64) {}
}

fn assert_points_eq(actual: &[Point], expected: &[Point]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert_abs_diff_eq!(a.x, e.x, epsilon = 1e-9);
        assert_abs_diff_eq!(a.y, e.y, epsilon = 1e-9);
    }
}

#[test]
fn triangle_approximates_to_three_vertices() {
    // Dark triangle with corners at (0,0), (255,0) and the apex near (128,127).
    let tri = field(256, 256, |x, y| y <= x && x + y <= 255);
    let raster = render::render_field(&tri, Colormap::Grayscale);
    let config = MaskConfig {
        median_radius: 0,
        gaussian_sigma: 0.0,
        threshold: 128,
    };

    let extraction = mask::extract(&raster, &config).expect("triangle should produce a contour");
    assert_eq!(extraction.component_count, 1);

    let vertices = approximate::approximate(&extraction.contour, &ApproximationConfig::default());
    assert_eq!(vertices.len(), 3, "got {vertices:?}");
}

#[test]
fn triangle_touching_top_edge_has_degenerate_scale() {
    // The top-left corner is both the min(x+y) and min(x-y) pixel, so
    // the reference pixels span no height.
    let tri = field(256, 256, |x, y| y <= x && x + y <= 255);
    let mut config = PipelineConfig::default();
    config.colormap = Colormap::Grayscale;
    config.mask = MaskConfig {
        median_radius: 0,
        gaussian_sigma: 0.0,
        threshold: 128,
    };
    config.references.source = ReferenceSource::Mask;

    let err = wedgemesh_pipeline::process(&tri, &config).unwrap_err();
    assert!(
        matches!(
            err,
            PipelineError::DegenerateScale {
                axis: Axis::Y,
                extent: 0
            }
        ),
        "got {err:?}"
    );
}

#[test]
fn block_end_to_end() {
    let result = wedgemesh_pipeline::process(&block_field(), &plain_config()).unwrap();

    assert_eq!(result.references.left_upper, PixelPoint::new(10, 10));
    assert_eq!(result.references.left_lower, PixelPoint::new(10, 29));
    assert_eq!(result.references.right_lower, PixelPoint::new(49, 29));
    assert_eq!(result.dimensions.width, 60);
    assert_eq!(result.dimensions.height, 40);

    let w = 39.0 / 19.0;
    assert_points_eq(
        result.points.points(),
        &[
            Point::new(0.0, 1.0),
            Point::new(w, 1.0),
            Point::new(w, 0.0),
            Point::new(0.0, 0.0),
        ],
    );
}

#[test]
fn staged_result_exposes_intermediates() {
    let staged = wedgemesh_pipeline::process_staged(&block_field(), &plain_config()).unwrap();

    assert_eq!(staged.raster.dimensions(), (60, 40));
    assert_eq!(staged.mask.dimensions(), (60, 40));
    assert_eq!(staged.mask.get_pixel(20, 20).0[0], mask::FOREGROUND);
    assert_eq!(staged.mask.get_pixel(5, 5).0[0], mask::BACKGROUND);

    let mut corners = staged.approximated.clone();
    corners.sort_unstable();
    assert_eq!(
        corners,
        vec![
            PixelPoint::new(10, 10),
            PixelPoint::new(10, 29),
            PixelPoint::new(49, 10),
            PixelPoint::new(49, 29),
        ],
    );
    assert_eq!(staged.normalized.len(), 4);
    assert_eq!(staged.physical.len(), 4);
    assert_eq!(staged.clone().into_result().points, staged.ordered);
}

#[test]
fn scaling_inverts_back_to_pixels() {
    let staged = wedgemesh_pipeline::process_staged(&block_field(), &plain_config()).unwrap();
    let scaler = PhysicalScaler::new(&staged.references, &ScaleConfig::default()).unwrap();
    for (pixel, physical) in staged.normalized.iter().zip(&staged.physical) {
        let back = scaler.to_pixel(*physical);
        assert_abs_diff_eq!(back.x, f64::from(pixel.x), epsilon = 1e-6);
        assert_abs_diff_eq!(back.y, f64::from(pixel.y), epsilon = 1e-6);
    }
}

#[test]
fn intensity_source_anchors_to_rendered_extent() {
    let mut config = plain_config();
    config.references.source = ReferenceSource::Intensity;

    let result = wedgemesh_pipeline::process(&block_field(), &config).unwrap();
    assert_eq!(result.references.left_upper, PixelPoint::new(0, 0));
    assert_eq!(result.references.left_lower, PixelPoint::new(0, 39));
    assert_eq!(result.references.right_lower, PixelPoint::new(59, 39));

    let first = result.points.first().unwrap();
    assert_abs_diff_eq!(first.x, 10.0 / 39.0, epsilon = 1e-9);
    assert_abs_diff_eq!(first.y, 29.0 / 39.0, epsilon = 1e-9);
}

#[test]
fn union_policy_feeds_reference_pixels_into_normalization() {
    let mut config = plain_config();
    config.references.source = ReferenceSource::Intensity;
    config.references.policy = ReferencePolicy::Union;

    let staged = wedgemesh_pipeline::process_staged(&block_field(), &config).unwrap();
    let mut kept = staged.normalized.clone();
    kept.sort_unstable();
    assert_eq!(
        kept,
        vec![
            PixelPoint::new(0, 39),
            PixelPoint::new(10, 10),
            PixelPoint::new(49, 10),
            PixelPoint::new(59, 39),
        ],
    );
}

#[test]
fn ordered_points_are_unique_and_start_top_left() {
    let result = wedgemesh_pipeline::process(&block_field(), &plain_config()).unwrap();
    let points = result.points.points();
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            assert_ne!(a, b);
        }
    }
    let first = points[0];
    assert!(points.iter().all(|p| p.x >= first.x));
    assert!(
        points
            .iter()
            .filter(|p| p.x == first.x)
            .all(|p| p.y <= first.y)
    );
}

#[test]
fn pipeline_is_deterministic() {
    let config = PipelineConfig::default();
    let input = double_ramp_field();
    let a = wedgemesh_pipeline::process(&input, &config).unwrap();
    let b = wedgemesh_pipeline::process(&input, &config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn double_ramp_with_defaults_meshes() {
    let result = wedgemesh_pipeline::process(&double_ramp_field(), &PipelineConfig::default())
        .expect("default pipeline should accept a double ramp");

    // Rendered extent anchors the scale; the floor is the bottom row.
    assert_eq!(result.references.left_upper, PixelPoint::new(0, 0));
    assert_eq!(result.references.left_lower, PixelPoint::new(0, 199));
    assert_eq!(result.references.right_lower, PixelPoint::new(399, 199));

    let points = result.points.points();
    assert_eq!(points.len(), 12, "{points:?}");
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            assert_ne!(a, b);
        }
    }

    let first = points[0];
    assert_eq!(first.x, 0.0);
    assert!(points.iter().all(|p| p.x >= first.x));
    assert!(
        points
            .iter()
            .filter(|p| p.x == first.x)
            .all(|p| p.y <= first.y)
    );

    // Six wall points above the channel, six mirrored onto the floor.
    let floor = points.iter().filter(|p| p.y.abs() < 1e-12).count();
    assert_eq!(floor, 6, "{points:?}");
    assert!(points.iter().all(|p| p.y.abs() < 1e-12 || p.y > 0.4));

    let mut recorder = LineCounter::default();
    build_boundary_mesh(points, &MeshTopology::double_ramp(), &mut recorder).unwrap();
    assert_eq!(recorder.points, 12);
    assert_eq!(recorder.lines, 12);
}

#[test]
fn bright_field_has_no_contour() {
    let input = field(32, 32, |_, _| false);
    let err = wedgemesh_pipeline::process(&input, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::NoContourFound));
    assert_eq!(err.kind(), "no_contour_found");
}

#[test]
fn invalid_config_is_rejected_before_processing() {
    let mut config = PipelineConfig::default();
    config.scale.domain_height = -1.0;
    let err = wedgemesh_pipeline::process(&block_field(), &config).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(_)));
}

#[test]
fn archive_lookup_reports_missing_key() {
    let mut archive = MemoryArchive::new().with_field("pressure", Array2::zeros((4, 4)));
    let err =
        wedgemesh_pipeline::process_archive(&mut archive, "density", &PipelineConfig::default())
            .unwrap_err();
    match err {
        PipelineError::MissingFieldKey { key, available } => {
            assert_eq!(key, "density");
            assert_eq!(available, vec!["pressure".to_string()]);
        }
        other => panic!("expected MissingFieldKey, got {other:?}"),
    }
}

#[test]
fn archive_lookup_runs_pipeline() {
    let block = block_field();
    let mut archive = MemoryArchive::new().with_field("density", block.values().clone());
    let result =
        wedgemesh_pipeline::process_archive(&mut archive, "density", &plain_config()).unwrap();
    assert_eq!(result.points.len(), 4);
}
