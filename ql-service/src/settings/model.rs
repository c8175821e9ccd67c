//! Settings document model
//!
//! One flat JSON document holds every operating parameter. Missing keys fill
//! from the built-in defaults on load, so adding a field later never breaks
//! an existing installation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text alignment inside the label canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Lenient parse for caller-supplied strings: anything unrecognized
    /// falls back to left instead of erroring. The persisted settings
    /// document is strict; this is only for render requests.
    pub fn parse_or_default(s: &str) -> Alignment {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" => Alignment::Center,
            "right" => Alignment::Right,
            _ => Alignment::Left,
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alignment::Left => write!(f, "left"),
            Alignment::Center => write!(f, "center"),
            Alignment::Right => write!(f, "right"),
        }
    }
}

/// A named printer profile: a complete alternative printer selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub printer_uri: String,
    pub printer_model: String,
    pub label_size: String,
}

/// The settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_printer_uri")]
    pub printer_uri: String,
    #[serde(default = "default_printer_model")]
    pub printer_model: String,
    #[serde(default = "default_label_size")]
    pub label_size: String,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default)]
    pub alignment: Alignment,
    #[serde(default)]
    pub rotate: u16,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub dither: bool,
    #[serde(default)]
    pub compress: bool,
    #[serde(default)]
    pub red: bool,
    #[serde(default)]
    pub keep_alive_enabled: bool,
    #[serde(default = "default_keep_alive_interval")]
    pub keep_alive_interval: u64,
    #[serde(default = "default_printers")]
    pub printers: Vec<PrinterProfile>,
}

fn default_printer_uri() -> String {
    "tcp://192.168.1.100".to_string()
}

fn default_printer_model() -> String {
    "QL-800".to_string()
}

fn default_label_size() -> String {
    "62".to_string()
}

fn default_font_size() -> u32 {
    50
}

fn default_threshold() -> f64 {
    70.0
}

fn default_keep_alive_interval() -> u64 {
    60
}

fn default_printers() -> Vec<PrinterProfile> {
    vec![PrinterProfile {
        id: "default".to_string(),
        name: "Default Printer".to_string(),
        printer_uri: default_printer_uri(),
        printer_model: default_printer_model(),
        label_size: default_label_size(),
    }]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            printer_uri: default_printer_uri(),
            printer_model: default_printer_model(),
            label_size: default_label_size(),
            font_size: default_font_size(),
            alignment: Alignment::Left,
            rotate: 0,
            threshold: default_threshold(),
            dither: false,
            compress: false,
            red: false,
            keep_alive_enabled: false,
            keep_alive_interval: default_keep_alive_interval(),
            printers: default_printers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_parse_or_default() {
        assert_eq!(Alignment::parse_or_default("center"), Alignment::Center);
        assert_eq!(Alignment::parse_or_default("RIGHT"), Alignment::Right);
        assert_eq!(Alignment::parse_or_default("justify"), Alignment::Left);
        assert_eq!(Alignment::parse_or_default(""), Alignment::Left);
    }

    #[test]
    fn test_alignment_serde_is_strict() {
        assert!(serde_json::from_str::<Alignment>("\"center\"").is_ok());
        assert!(serde_json::from_str::<Alignment>("\"justify\"").is_err());
    }

    #[test]
    fn test_missing_keys_fill_from_defaults() {
        let s: Settings = serde_json::from_str(
            r#"{"printer_uri": "tcp://10.0.0.5", "printer_model": "QL-820NWB", "label_size": "29"}"#,
        )
        .unwrap();
        assert_eq!(s.printer_uri, "tcp://10.0.0.5");
        assert_eq!(s.label_size, "29");
        assert_eq!(s.font_size, 50);
        assert_eq!(s.threshold, 70.0);
        assert!(!s.keep_alive_enabled);
        assert_eq!(s.printers.len(), 1);
    }

    #[test]
    fn test_profile_name_defaults_empty() {
        let p: PrinterProfile = serde_json::from_str(
            r#"{"id": "x", "printer_uri": "tcp://1.2.3.4", "printer_model": "QL-800", "label_size": "62"}"#,
        )
        .unwrap();
        assert_eq!(p.name, "");
    }
}
