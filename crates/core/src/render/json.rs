use crate::Result;
use crate::result::Extraction;

/// Configuration for JSON output
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Pretty print JSON output
    pub pretty: bool,
    /// Drop blank lines from content results, as the report does
    pub skip_blank_lines: bool,
}

/// Convert a parsed result to JSON
pub fn convert_to_json(extraction: &Extraction, config: &JsonConfig) -> Result<String> {
    let trimmed;
    let extraction = match extraction {
        Extraction::Content(result) if config.skip_blank_lines => {
            let mut result = result.clone();
            result.lines.retain(|line| !line.is_blank());
            trimmed = Extraction::Content(result);
            &trimmed
        }
        other => other,
    };

    let json = if config.pretty { serde_json::to_string_pretty(extraction) } else { serde_json::to_string(extraction) };
    Ok(json?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{ExtractionResult, ExtractionText, Line, Unit, UnitKind};

    fn line(text: &str) -> Line {
        Line {
            num_tags: 1,
            num_chars: text.len() as u64,
            tag_ratio: 0.5,
            smoothed_tag_ratio: 0.5,
            derivative: 0.0,
            smoothed_derivative: 0.0,
            is_content: true,
            units: vec![Unit::new(UnitKind::Text, text)],
        }
    }

    #[test]
    fn test_content_json_shape() {
        let extraction = Extraction::Content(ExtractionResult::new(vec![line("Hello")]));
        let json = convert_to_json(&extraction, &JsonConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["kind"], "content");
        assert_eq!(value["lines"][0]["is_content"], true);
        assert_eq!(value["lines"][0]["units"][0]["kind"], "text");
        assert_eq!(value["lines"][0]["units"][0]["content"], "Hello");
    }

    #[test]
    fn test_skip_blank_lines() {
        let extraction = Extraction::Content(ExtractionResult::new(vec![line("  "), line("Hi")]));
        let config = JsonConfig { skip_blank_lines: true, ..Default::default() };
        let value: serde_json::Value = serde_json::from_str(&convert_to_json(&extraction, &config).unwrap()).unwrap();
        assert_eq!(value["lines"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_text_json_pretty() {
        let extraction = Extraction::Text(ExtractionText::from_lines(["a", "b"]));
        let json = convert_to_json(&extraction, &JsonConfig { pretty: true, ..Default::default() }).unwrap();
        assert!(json.contains('\n'));
        assert!(json.contains("\"kind\": \"text\""));
    }
}
