pub mod constants;
pub mod time;
pub mod types;

pub use time::current_time_millis;
