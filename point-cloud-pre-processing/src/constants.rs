/// Pipeline-internal configuration that is not user facing

/// Points per parallel chunk when reducing coordinate bounds
pub const BOUNDS_CHUNK_SIZE: usize = 25_000;

/// zstd level for persisted artifacts (3 = good balance of speed/size)
pub const ARTIFACT_COMPRESSION_LEVEL: i32 = 3;

/// Dataset metadata file name inside a disk cache directory
pub const METADATA_FILE: &str = "metadata.json";

/// Extension of encoded slice and profile artifacts
pub const ARTIFACT_EXTENSION: &str = "bin";

/// Relative tolerance when testing a grid node against a triangle
pub const BARYCENTRIC_EPSILON: f64 = 1e-10;

/// Quantisation of normalised coordinates for Morton insertion order
pub const MORTON_GRID_RESOLUTION: u32 = 1 << 16;

/// Progress bar layout shared by all preprocessing stages
pub const PROGRESS_TEMPLATE: &str = "[{bar:40.green/blue}] {pos}/{len} {msg} ({percent}%)";

pub const PROGRESS_CHARS: &str = "▉▊▋▌▍▎▏ ";
