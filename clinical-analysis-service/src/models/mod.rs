pub mod entities;
pub mod input;
pub mod result;

pub use entities::*;
pub use input::*;
pub use result::*;
