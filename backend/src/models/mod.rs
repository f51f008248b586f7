pub mod conflict;
pub mod macros;
pub mod time;
pub mod timetable;

pub use conflict::*;
pub use time::*;
pub use timetable::*;
