//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::io::Read;

use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::database::Database;
use crate::core::descriptor::EntityDescriptor;
use crate::core::value::{parse_decimal, Fields};

/// Configuration with command-line overrides applied
pub fn load_config(global: &GlobalOpts) -> Config {
    let mut config = Config::load();
    if let Some(ref path) = global.database {
        config.database = Some(path.clone());
    }
    config
}

/// Open the configured database, creating it if needed
pub fn open_database(global: &GlobalOpts) -> Result<(Config, Database)> {
    let config = load_config(global);
    let db = Database::open(config.database_path())?;
    Ok((config, db))
}

/// Parse `--data` into a field set; `-` reads the JSON from stdin
pub fn read_fields(descriptor: &EntityDescriptor, data: &str) -> Result<Fields> {
    let text = if data == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
        buf
    } else {
        data.to_string()
    };

    let json: serde_json::Value = serde_json::from_str(&text)
        .into_diagnostic()
        .map_err(|e| e.wrap_err("--data must be a JSON object"))?;
    Ok(Fields::from_json(descriptor, &json)?)
}

/// clap value parser for decimal arguments ("0.001", "1e-6")
pub fn parse_decimal_arg(s: &str) -> std::result::Result<Decimal, String> {
    parse_decimal(s.trim()).ok_or_else(|| format!("'{}' is not a decimal number", s))
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::brand::BRAND;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }

    #[test]
    fn test_parse_decimal_arg() {
        assert_eq!(parse_decimal_arg("0.001").unwrap(), Decimal::new(1, 3));
        assert_eq!(parse_decimal_arg("1e-6").unwrap(), Decimal::new(1, 6));
        assert!(parse_decimal_arg("ten").is_err());
    }

    #[test]
    fn test_read_fields() {
        let fields = read_fields(&BRAND, r#"{"id": "ACME", "name": "Acme"}"#).unwrap();
        assert_eq!(fields.len(), 2);
        assert!(read_fields(&BRAND, "not json").is_err());
    }
}
