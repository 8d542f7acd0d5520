pub mod data;
pub mod molecules;
pub mod run;
