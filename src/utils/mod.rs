pub mod clock;
pub mod date;
pub mod path;
pub mod table;
pub mod time;
