pub mod computer;
pub mod job;
pub mod states;
