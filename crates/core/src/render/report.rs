use quick_xml::escape::escape;

use crate::result::{Extraction, ExtractionResult, ExtractionText, Line, UnitKind};

/// Markup labels and classes used by the report table.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// `id` of the content-mode table.
    pub content_table_id: String,
    /// `id` of the text-mode table.
    pub text_table_id: String,
    /// Header labels: sequence number, tag count, char count, tag ratio,
    /// smoothed tag ratio, derivative, smoothed derivative, text.
    pub column_labels: [String; 8],
    /// Row class for lines classified as content.
    pub content_class: String,
    /// Row class for lines classified as non-content.
    pub non_content_class: String,
    pub tag_class: String,
    pub text_class: String,
    pub invisible_class: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            content_table_id: "result".to_string(),
            text_table_id: "text".to_string(),
            column_labels: ["#", "Tags", "Chars", "Ti", "Ti'", "Gi", "Gi'", "Text"].map(String::from),
            content_class: "content".to_string(),
            non_content_class: "non-content".to_string(),
            tag_class: "tag".to_string(),
            text_class: "text".to_string(),
            invisible_class: "invisible".to_string(),
        }
    }
}

impl ReportConfig {
    fn unit_class(&self, kind: UnitKind) -> &str {
        match kind {
            UnitKind::Tag => &self.tag_class,
            UnitKind::Text => &self.text_class,
            UnitKind::Invisible => &self.invisible_class,
        }
    }

    fn row_class(&self, line: &Line) -> &str {
        if line.is_content { &self.content_class } else { &self.non_content_class }
    }
}

/// Renders parsed engine output as an HTML table
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    config: ReportConfig,
}

impl ReportRenderer {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Render either kind of result
    pub fn render(&self, extraction: &Extraction) -> String {
        render(extraction, &self.config)
    }
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new(ReportConfig::default())
    }
}

/// Render either kind of result with the given configuration
pub fn render(extraction: &Extraction, config: &ReportConfig) -> String {
    match extraction {
        Extraction::Content(result) => render_content(result, config),
        Extraction::Text(text) => render_text(text, config),
    }
}

/// Render a classified content result.
///
/// Lines whose units are whitespace only get no row and no number.
pub fn render_content(result: &ExtractionResult, config: &ReportConfig) -> String {
    let mut output = String::new();
    output.push_str(&format!("   <table id=\"{}\">\n", escape(config.content_table_id.as_str())));

    output.push_str("    <tr>\n     ");
    for label in &config.column_labels {
        output.push_str(&format!("<th>{}</th>", escape(label.as_str())));
    }
    output.push_str("\n    </tr>\n");

    for (number, line) in result.numbered_lines() {
        output.push_str(&format!("    <tr class=\"{}\">\n", escape(config.row_class(line))));
        output.push_str(&format!("     <th class=\"id\">{number}</th>"));
        output.push_str(&format!("<td class=\"number\">{}</td>", line.num_tags));
        output.push_str(&format!("<td class=\"number\">{}</td>", line.num_chars));
        for value in [line.tag_ratio, line.smoothed_tag_ratio, line.derivative, line.smoothed_derivative] {
            output.push_str(&format!("<td class=\"number\">{}</td>", fixed2(value)));
        }
        output.push_str("<td class=\"text\">");
        for unit in &line.units {
            output.push_str(&format!(
                "<span class=\"{}\">{}</span>",
                escape(config.unit_class(unit.kind)),
                escape(unit.content.as_str())
            ));
        }
        output.push_str("</td>\n    </tr>\n");
    }

    output.push_str("   </table>\n");
    output
}

/// Two-decimal fixed notation; non-finite values print as `nan`, `inf` or `-inf`.
fn fixed2(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{value:.2}")
    }
}

/// Render plain text lines as a numbered table
pub fn render_text(text: &ExtractionText, config: &ReportConfig) -> String {
    let mut output = String::new();
    output.push_str(&format!("   <table id=\"{}\">\n", escape(config.text_table_id.as_str())));

    for (number, line) in text.numbered_lines() {
        output.push_str("    <tr>\n");
        output.push_str(&format!("     <th>{number}</th>\n"));
        output.push_str(&format!("     <td>{}</td>\n", escape(line)));
        output.push_str("    </tr>\n");
    }

    output.push_str("   </table>\n");
    output
}
