pub mod gear_config;
pub mod acquisition;
