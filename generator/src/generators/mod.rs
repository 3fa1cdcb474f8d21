mod rust;

pub use rust::generate;
