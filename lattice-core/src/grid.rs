use log::debug;
use thiserror::Error;

/// Number of continuous state dimensions:
/// cart position, cart velocity, pole angle, pole angular velocity.
pub const STATE_DIMS: usize = 4;

/// Bins per dimension when no count is given.
pub const DEFAULT_BINS: usize = 20;

/// Fixed value range per state dimension, constant for the process lifetime.
/// The pole angle is in radians (0.418 rad is roughly 24 degrees).
const STATE_BOUNDS: [(f64, f64); STATE_DIMS] = [
    (-4.8, 4.8),     // cart position
    (-3.0, 3.0),     // cart velocity
    (-0.418, 0.418), // pole angle
    (-3.0, 3.0),     // pole angular velocity
];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[error("n_bins must be at least 1 (got {0})")]
    ZeroBins(usize),
}

/// Uniform bin lattice over the CartPole state space.
///
/// Maps any real-valued 4-dimensional state onto a tuple of bin indices,
/// each in `[0, n_bins - 1]`. Values outside the fixed ranges saturate into
/// the boundary bins, so the mapping is total and never fails.
pub struct StateGrid {
    n_bins: usize,
    edges: [Vec<f64>; STATE_DIMS],
}

impl StateGrid {
    /// Builds a grid with `n_bins` bins per dimension.
    ///
    /// Precomputes the `n_bins - 1` interior edges of an equal-width
    /// partition of each dimension's range. Edges never change afterward.
    ///
    /// # Errors
    /// Returns [`GridError::ZeroBins`] if `n_bins` is 0; the saturating
    /// index clip is only well-defined for at least one bin.
    pub fn new(n_bins: usize) -> Result<Self, GridError> {
        if n_bins == 0 {
            return Err(GridError::ZeroBins(n_bins));
        }

        let edges = STATE_BOUNDS.map(|(low, high)| {
            let width = (high - low) / n_bins as f64;
            (1..n_bins).map(|k| low + k as f64 * width).collect()
        });

        debug!(
            "StateGrid ready: {} bins/dim, {} interior edges/dim",
            n_bins,
            n_bins - 1
        );

        Ok(Self { n_bins, edges })
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// The fixed `(low, high)` range of each state dimension.
    pub fn bounds(&self) -> &'static [(f64, f64); STATE_DIMS] {
        &STATE_BOUNDS
    }

    /// Interior bin edges for one dimension, sorted ascending.
    pub fn bin_edges(&self, dim: usize) -> &[f64] {
        &self.edges[dim]
    }

    /// Maps a continuous state onto one bin index per dimension.
    ///
    /// The index is the count of interior edges less than or equal to the
    /// value (a value exactly on an edge belongs to the bin above), clipped
    /// into `[0, n_bins - 1]` so out-of-range values land in the boundary
    /// bins. NaN carries no ordering and resolves to bin 0.
    pub fn discretize(&self, state: &[f64; STATE_DIMS]) -> [usize; STATE_DIMS] {
        let mut indices = [0usize; STATE_DIMS];
        for (i, (&value, edges)) in state.iter().zip(self.edges.iter()).enumerate() {
            let raw = edges.partition_point(|&edge| edge <= value);
            indices[i] = raw.min(self.n_bins - 1);
        }
        indices
    }

    /// Size of the discrete state space: `n_bins` along every dimension.
    /// A value table addressable by `discretize` output has this shape.
    pub fn shape(&self) -> [usize; STATE_DIMS] {
        [self.n_bins; STATE_DIMS]
    }

    /// Total cell count of a table of `shape()`.
    pub fn table_cells(&self) -> usize {
        self.n_bins.pow(STATE_DIMS as u32)
    }
}

impl Default for StateGrid {
    fn default() -> Self {
        Self::new(DEFAULT_BINS).expect("DEFAULT_BINS is nonzero")
    }
}
