pub mod event;
pub mod job;
pub mod lunch;
pub mod membership;
pub mod projection;
pub mod reference;
pub mod time_entry;
