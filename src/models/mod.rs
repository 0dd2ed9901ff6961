pub mod assessment;
pub mod catalog;
pub mod content;
pub mod file;
pub mod lookup;
pub mod profile;
pub mod user;

pub use assessment::*;
pub use catalog::*;
pub use content::*;
pub use file::*;
pub use lookup::*;
pub use profile::*;
pub use user::*;
