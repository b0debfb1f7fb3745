pub mod errors;
pub mod query;
pub mod responses;
pub mod stats;
pub mod todo;

pub use errors::*;
pub use query::*;
pub use responses::*;
pub use stats::*;
pub use todo::*;
