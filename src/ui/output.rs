use crate::symbol::Location;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!("{} {}: {}", Icons::INFO, label.style(theme().label.clone()), value);
}

/// Heading for one symbol: its name, then the usr
pub fn symbol_section(name: &str, usr: &str) {
    println!();
    println!("━{} ({})━", name.style(theme().header.clone()), usr.style(theme().usr.clone()));
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

/// One location, with the source path when it is known
pub fn location_row(location: &Location, path: Option<&str>) {
    let source = match path {
        Some(path) => path.to_string(),
        None => format!("source #{}", location.source_id),
    };
    println!(
        "  {} {}:{} {}",
        Icons::PIN,
        source.style(theme().path.clone()),
        format!("{}:{}", location.line, location.column).style(theme().position.clone()),
        format!("(symbol {})", location.symbol_id).style(theme().symbol_id.clone())
    );
}
