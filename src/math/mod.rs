//! Mathematical utilities: special functions, root finding, and division guards.

pub mod guard;
pub mod roots;
pub mod special;

pub use guard::*;
pub use roots::*;
pub use special::*;
