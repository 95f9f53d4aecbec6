//! Terminal output helpers shared by the CLI handlers.

use ansi_term::{Colour, Style};
use std::fmt;

pub fn info<T: fmt::Display>(msg: T) {
    println!("{} {}", Colour::Blue.bold().paint("ℹ"), msg);
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{} {}", Colour::Green.bold().paint("✔"), msg);
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{} {}", Colour::Yellow.bold().paint("⚠"), msg);
}

pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{} {}", Colour::Red.bold().paint("✘"), msg);
}

pub fn header<T: fmt::Display>(msg: T) {
    println!("{}", Colour::Cyan.bold().paint(format!("== {msg} ==")));
}

/// `label: value` with the label highlighted.
pub fn field<L: fmt::Display, V: fmt::Display>(label: L, value: V) {
    println!("{} {}", Colour::Cyan.paint(format!("• {label}:")), value);
}

/// Colour used for an operation name in the internal log listing.
pub fn operation_style(operation: &str) -> Style {
    match operation {
        "clock_in" => Colour::Green.normal(),
        "clock_out" => Colour::Yellow.normal(),
        "job_completed" => Colour::Green.bold(),
        "end_active" => Colour::Red.normal(),
        "migration_applied" => Colour::Purple.normal(),
        "lunch_override" | "lunch_override_cleared" => Colour::Blue.normal(),
        "team_join" | "team_leave" => Colour::Cyan.normal(),
        "init" => Colour::White.bold(),
        _ => Style::new(),
    }
}

/// Grey placeholder for empty cells.
pub fn dash() -> String {
    Colour::Fixed(244).paint("--").to_string()
}
