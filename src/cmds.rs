pub mod archive;
pub mod command;
pub mod run;
