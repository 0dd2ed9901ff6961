pub mod policy;
pub mod scope;

pub use policy::*;
pub use scope::*;
