pub mod entry;
pub mod paper;
pub mod venue;

pub use entry::*;
pub use paper::*;
pub use venue::*;
