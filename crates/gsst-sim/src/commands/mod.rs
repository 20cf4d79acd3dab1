pub mod merge;
pub mod report;
pub mod resume;
pub mod run;
