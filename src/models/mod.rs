pub mod metrics;
pub mod plan;
pub mod window;

pub use metrics::*;
pub use plan::*;
pub use window::*;
