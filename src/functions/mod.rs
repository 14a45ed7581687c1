pub mod formatting;
pub mod marquee;
