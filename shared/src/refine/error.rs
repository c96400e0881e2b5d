use thiserror::Error;

/// Errors that can occur when refining a mesh
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefineError {
    /// Face counts don't add up to the index count
    #[error("Face counts sum to {counted} but the mesh has {indices} indices. The topology arrays are inconsistent")]
    CountMismatch { counted: usize, indices: usize },

    /// A face declares a negative number of corners
    #[error("Face {face} has a negative corner count")]
    NegativeCount { face: usize },

    /// An index refers to a point that doesn't exist
    #[error("Index {index} at corner {corner} is out of range for {point_count} points")]
    IndexOutOfRange {
        corner: usize,
        index: i32,
        point_count: usize,
    },
}
