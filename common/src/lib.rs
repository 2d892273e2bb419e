pub mod logger;
pub mod time;
