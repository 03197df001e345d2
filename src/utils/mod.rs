pub mod errors;
pub mod output;
pub mod paths;
pub mod pem;

pub use errors::*;
pub use output::*;
pub use paths::*;
