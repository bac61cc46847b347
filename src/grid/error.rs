use thiserror::Error;

/// Invalid grid or polygon-layer inputs of the weighting pipeline.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("{axis} axis needs at least two coordinates, found {len}")]
    TooFewCoordinates { axis: &'static str, len: usize },

    #[error("{axis} axis contains a non-finite coordinate at index {index}")]
    NonFiniteCoordinate { axis: &'static str, index: usize },

    #[error("{axis} axis has zero spacing between its first two coordinates")]
    ZeroStep { axis: &'static str },

    #[error("{layer} layer has {shapes} shapes but {attributes} attribute values")]
    LayerLengthMismatch { layer: &'static str, shapes: usize, attributes: usize },

    #[error("land fraction {value} at index {index} is not finite")]
    InvalidLandFraction { index: usize, value: f64 },
}
