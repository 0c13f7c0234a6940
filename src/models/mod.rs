pub mod devices;
pub mod outcome;
pub mod params;

pub use devices::*;
pub use outcome::*;
pub use params::*;
