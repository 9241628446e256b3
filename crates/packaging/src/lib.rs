pub mod builder;
pub mod probe;
pub mod recipe;

pub use builder::*;
pub use probe::*;
pub use recipe::*;
