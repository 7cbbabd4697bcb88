pub mod timefmt;
pub mod urlcheck;
