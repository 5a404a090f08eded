use crate::output::is_quiet;
use crate::ui::{theme, Icons};
use crate::validator::Verdict;
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::ROCKET, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    if is_quiet() {
        return;
    }
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

pub fn file_new(filename: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::NEW.style(theme().success.clone()), filename);
}

pub fn file_skipped(filename: &str, reason: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {} {}", Icons::SKIP, filename.style(theme().duplicate.clone()), dim(reason));
}

pub fn file_failed(path: &str, reason: &str) {
    eprintln!("{} {}: {}", Icons::CROSS, path.style(theme().error.clone()), reason);
}

pub fn summary_row(label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!("  {} {}", label.style(theme().dim.clone()), value);
}

/// Print a validator verdict; the diagnostic goes to stderr
pub fn verdict(subject: &str, verdict: &Verdict) {
    match verdict {
        Verdict::Valid => success(&format!("{} is valid", subject)),
        Verdict::Invalid(diagnostic) => {
            error(&format!("{} was rejected by the validator", subject));
            for line in diagnostic.lines() {
                eprintln!("   {}", line.style(theme().diagnostic.clone()));
            }
        }
    }
}
