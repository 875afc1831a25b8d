pub mod dates;
pub mod field;
pub mod recommendation;
pub mod schedule;
pub mod style;

pub use field::*;
pub use recommendation::*;
pub use schedule::*;
pub use style::*;
