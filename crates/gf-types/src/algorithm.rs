//! Keys of the training backend variants shipped with the pipeline.

/// Tree-based genetic programming.
pub const GP: &str = "gp";
/// Geometric semantic genetic programming.
pub const GSGP: &str = "gsgp";
/// Multi-representation semantic learning ("slim").
pub const SLIM: &str = "slim";

pub const KNOWN_ALGORITHMS: [&str; 3] = [GP, GSGP, SLIM];
