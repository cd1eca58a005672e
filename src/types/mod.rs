pub mod bar;
pub mod trading;

pub use bar::*;
pub use trading::*;
