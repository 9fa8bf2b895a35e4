use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::{DomainError, Role, StoredTurn};

/// Largest number of turns included in an export.
pub const EXPORT_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Txt,
    Json,
}

impl FromStr for ExportFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            other => Err(DomainError::validation(format!(
                "unsupported export format '{other}'"
            ))),
        }
    }
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Txt => "text/plain; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

#[derive(Serialize)]
struct ExportedTurn<'a> {
    role: &'static str,
    content: &'a str,
}

pub fn render_transcript(turns: &[StoredTurn], format: ExportFormat) -> Result<String, DomainError> {
    match format {
        ExportFormat::Json => {
            let exported: Vec<ExportedTurn<'_>> = turns
                .iter()
                .map(|t| ExportedTurn {
                    role: t.role.as_str(),
                    content: &t.text,
                })
                .collect();
            serde_json::to_string_pretty(&exported).map_err(|e| DomainError::internal(e.to_string()))
        }
        ExportFormat::Txt => {
            let mut out = String::from("AI TUTOR - CONVERSATION HISTORY\n");
            out.push_str(&"=".repeat(60));
            out.push_str("\n\n");
            for turn in turns {
                let speaker = match turn.role {
                    Role::User => "Student",
                    Role::Assistant => "AI Tutor",
                };
                out.push_str(&format!("{speaker}: {}\n\n", turn.text));
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns() -> Vec<StoredTurn> {
        vec![
            StoredTurn::new(Role::User, "What is light?"),
            StoredTurn::new(Role::Assistant, "A form of energy."),
        ]
    }

    #[test]
    fn test_txt_export() {
        let text = render_transcript(&turns(), ExportFormat::Txt).unwrap();
        let expected = format!(
            "AI TUTOR - CONVERSATION HISTORY\n{}\n\nStudent: What is light?\n\nAI Tutor: A form of energy.\n\n",
            "=".repeat(60)
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_json_export() {
        let json = render_transcript(&turns(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"role": "user", "content": "What is light?"},
                {"role": "assistant", "content": "A form of energy."}
            ])
        );
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Txt);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }
}
