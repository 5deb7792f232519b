pub mod code_hash;
pub mod masking;
pub mod validation;

pub use code_hash::*;
pub use masking::*;
pub use validation::*;
