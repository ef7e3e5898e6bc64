pub mod dataset;
pub mod errors;
pub mod explanation;
pub mod metrics;
pub mod model;
pub mod oracle;
pub mod task;

pub use dataset::*;
pub use errors::*;
pub use explanation::*;
pub use model::*;
pub use oracle::*;
pub use task::*;
