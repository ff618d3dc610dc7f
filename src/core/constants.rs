//! Numerical constants shared across the basis engine.

/// Constants used by normalization, embedding and operator application
pub mod basis_constants {
    /// Maximum number of basis states listed by a basis description.
    pub const MAXPRINT: usize = 50;
    /// Largest local dimension whose digits print as a single `0-9a-z` character.
    pub const MAX_SPS: usize = 36;
    /// Squared norms below this value mark a representative as excluded from a sector.
    pub const NORM_TOLERANCE: f64 = 1e-10;
    /// Imaginary parts below this magnitude are treated as zero when a real dtype is requested.
    pub const IMAG_TOLERANCE: f64 = 1e-12;
    /// Used for momentum phases (`e^(ikr)`)
    pub const PI: f64 = std::f64::consts::PI;
}
