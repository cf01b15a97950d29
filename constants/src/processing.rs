/// Default processing parameters shared by the pre-processor and its consumers

/// Number of slices generated per plane family
pub const SLICE_COUNT: usize = 15;

/// Resolution of every slice grid (G x G) and every line profile (G positions)
pub const GRID_SIZE: usize = 400;

/// Slice selection window as a fraction of the fixed axis span
pub const SLICE_TOLERANCE: f64 = 0.01;

/// Centerline selection window as a fraction of the cross axis spans
pub const LINE_TOLERANCE: f64 = 0.05;

/// Line profile bin width as a multiple of the nominal position spacing
pub const BIN_WIDTH_FACTOR: f64 = 1.1;

/// Minimum points a slice window must select before a slice is produced
pub const MIN_SLICE_POINTS: usize = 10;

/// Coordinate columns every input table must provide
pub const COORDINATE_COLUMNS: [&str; 3] = ["x", "y", "z"];
