use colored::{Color, Colorize};

pub struct Utils;

pub enum PrintOp {
    Create { is_dir: bool },
    Update,
    Delete,
}

impl Utils {
    pub fn print_status(rel: &str, op: PrintOp) {
        match op {
            PrintOp::Create { is_dir } => {
                let color = if is_dir { Color::Blue } else { Color::Green };
                println!("{}", format!("+ {}", rel).color(color));
            }
            PrintOp::Update => {
                println!("{}", format!("~ {}", rel).color(Color::Yellow));
            }
            PrintOp::Delete => {
                println!("{}", format!("- {}", rel).color(Color::Red));
            }
        }
    }
}
