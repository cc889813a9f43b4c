pub mod algorithm;
pub mod dataset;
pub mod errors;
pub mod evolution;
pub mod fold;
pub mod params;

pub use dataset::*;
pub use errors::*;
pub use evolution::*;
pub use fold::*;
pub use params::*;
