pub mod report;
pub mod realtime;

pub use report::*;
pub use realtime::*;
