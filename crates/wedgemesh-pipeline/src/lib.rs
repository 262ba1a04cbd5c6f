//! wedgemesh-pipeline: Pure geometry extraction pipeline (sans-IO).
//!
//! Recovers the boundary polygon of a wedge or ramp from a 2-D CFD
//! scalar field through:
//! render -> denoise -> threshold -> contour -> reference pixels ->
//! approximation -> count normalization -> physical scaling -> ordering.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! arrays and returns structured data. Archive reading, batch runs and
//! file output live in `wedgemesh-io`.

pub mod approximate;
pub mod contour;
pub mod corners;
pub mod denoise;
pub mod field;
pub mod mask;
pub mod mesh;
pub mod metadata;
pub mod normalize;
pub mod order;
pub mod render;
pub mod scale;
pub mod types;

pub use approximate::{ApproximationConfig, CornerPolicy};
pub use corners::{ReferenceConfig, ReferencePolicy, ReferenceSource};
pub use field::{FieldArchive, MemoryArchive, ScalarField, load_field};
pub use mask::MaskConfig;
pub use mesh::{BoundaryKind, MeshBuilder, MeshTopology, build_boundary_mesh};
pub use metadata::{FileMetadata, MetadataFilter};
pub use normalize::{LowerWallPolicy, NormalizeConfig};
pub use order::{OrderConfig, OrderingPolicy};
pub use render::Colormap;
pub use scale::{PhysicalScaler, ScaleConfig, ScalingPolicy};
pub use types::{
    Dimensions, OrderedPointList, PipelineConfig, PipelineError, PixelPoint, Point,
    ProcessResult, ReferencePixels, StagedResult,
};

/// Run the full pipeline on a field.
///
/// Produces the ordered physical boundary together with the reference
/// pixels that anchored it and the raster dimensions.
///
/// # Errors
///
/// See [`process_staged`].
pub fn process(
    field: &ScalarField,
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    process_staged(field, config).map(StagedResult::into_result)
}

/// Load `key` from `archive` and run the full pipeline on it.
///
/// # Errors
///
/// Returns [`PipelineError::MissingFieldKey`] if the key is absent,
/// plus everything [`process_staged`] can return.
pub fn process_archive<A: FieldArchive + ?Sized>(
    archive: &mut A,
    key: &str,
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    let field = load_field(archive, key)?;
    process(&field, config)
}

/// Run the full pipeline, preserving every intermediate result.
///
/// # Pipeline steps
///
/// 1. Render the field through the colormap
/// 2. Intensity conversion, median filter, optional Gaussian blur
/// 3. Inverted threshold and dominant-contour selection
/// 4. Reference pixels (mask or intensity foreground)
/// 5. Polygon approximation with corrective heuristics; optional
///    union with the reference pixels
/// 6. Count normalization; optional lower-wall mirroring
/// 7. Pixel-to-physical scaling
/// 8. Ordering and simple-polygon validation
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
/// Returns [`PipelineError::NoContourFound`] if the mask is empty.
/// Returns [`PipelineError::DegenerateScale`] if the reference pixels
/// span no height (or width, when anisotropic).
/// Returns [`PipelineError::SelfIntersecting`] if validation is enabled
/// and the ordered boundary crosses itself.
pub fn process_staged(
    field: &ScalarField,
    config: &PipelineConfig,
) -> Result<StagedResult, PipelineError> {
    config.validate()?;
    let dimensions = field.dimensions();

    // 1. Render.
    let raster = render::render_field(field, config.colormap);

    // 2-3. Denoise, threshold, select the wedge contour.
    let mask::MaskExtraction {
        intensity,
        mask,
        component_count,
        contour,
    } = mask::extract(&raster, &config.mask)?;

    // 4. Reference pixels.
    let reference_image = match config.references.source {
        ReferenceSource::Mask => &mask,
        ReferenceSource::Intensity => &intensity,
    };
    let references =
        corners::find_reference_pixels(reference_image).ok_or(PipelineError::NoContourFound)?;
    tracing::debug!(?references, "found reference pixels");

    // 5. Approximate.
    let approximated = approximate::approximate(&contour, &config.approximation);
    let mut raw = approximated.clone();
    if config.references.policy == ReferencePolicy::Union {
        raw.extend(references.to_array());
    }

    // 6. Normalize count.
    let mut normalized =
        normalize::normalize_count(&raw, contour.points(), config.normalize.target_count);
    if config.normalize.lower_wall == LowerWallPolicy::MirrorToFloor {
        let floor_y = references.left_lower.y;
        let collisions = normalize::floor_collisions(&normalized, floor_y);
        if collisions > 0 {
            tracing::warn!(
                floor_y,
                collisions,
                expected = config.normalize.output_count(),
                "floor copies coincide with existing points; boundary will be short"
            );
        }
        normalized = normalize::mirror_to_floor(&normalized, floor_y);
    }

    // 7. Scale.
    let scaler = PhysicalScaler::new(&references, &config.scale)?;
    let physical = scaler.scale_points(&normalized);

    // 8. Order.
    let ordered = order::order_points(&physical, &config.order)?;

    Ok(StagedResult {
        raster,
        intensity,
        mask,
        component_count,
        contour,
        references,
        approximated,
        normalized,
        physical,
        ordered,
        dimensions,
    })
}
