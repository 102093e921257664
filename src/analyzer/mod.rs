mod filter;
mod status;

pub use filter::{LengthFilter, ResultFilter};
pub use status::StatusClassifier;
