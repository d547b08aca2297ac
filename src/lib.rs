pub mod archive;
pub mod call;
pub mod cmds;
pub mod errors;
pub mod flywheel;
pub mod gear;
pub mod staging;
pub mod types;
pub mod utils;
