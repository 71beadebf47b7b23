pub mod assignment;
pub mod candidate;
pub mod evaluation;
pub mod paper;
pub mod submission;
