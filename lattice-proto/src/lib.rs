//! Lattice Proto: the JSON wire contract of the discretization service.
//!
//! Field names and shapes here are the public API; browser clients build
//! their requests against `DiscretizeRequest` and read back
//! `DiscretizeResponse`, so renaming a field is a breaking protocol change.

use serde::{Deserialize, Serialize};

/// Human-readable service name used in health responses.
pub const SERVICE_NAME: &str = "LATTICE API";

/// Body of `POST /api/discretize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscretizeRequest {
    /// `[position, velocity, angle, angular_velocity]`.
    pub state: [f64; 4],
    /// Bins per dimension; the server applies its default when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_bins: Option<usize>,
}

/// Successful discretization result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscretizeResponse {
    pub success: bool,
    pub discretized: [usize; 4],
    pub state_shape: [usize; 4],
    pub original_state: [f64; 4],
}

impl DiscretizeResponse {
    pub fn new(
        discretized: [usize; 4],
        state_shape: [usize; 4],
        original_state: [f64; 4],
    ) -> Self {
        Self {
            success: true,
            discretized,
            state_shape,
            original_state,
        }
    }
}

/// Error envelope shared by every failing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Body of `GET /api`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn running() -> Self {
        Self {
            status: "ok".to_string(),
            message: format!("{} is running", SERVICE_NAME),
        }
    }
}
