//! Complete response documents around a report.
//!
//! Every response is one HTML document: a title, the input navigation, and
//! a body holding either an input form, a report, or a single error message.

use quick_xml::escape::escape;

use crate::result::ExtractionKind;

/// Which input form a page belongs to; selects the highlighted tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputForm {
    #[default]
    Url,
    File,
    Html,
}

impl InputForm {
    pub const ALL: [Self; 3] = [Self::Url, Self::File, Self::Html];

    /// Reads a `form` selector; anything unknown selects the URL form.
    pub fn from_selector(value: &str) -> Self {
        match value {
            "file" => Self::File,
            "html" => Self::Html,
            _ => Self::Url,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::File => "file",
            Self::Html => "html",
        }
    }
}

const STYLESHEET: &str = r#"
    * { margin: 0; padding: 0; }
    a { color: inherit; text-decoration: none; }
    body { background: #FFF; color: #000; margin: 10px; padding: 10px; }
    h1#title { background: #666; border-radius: 10px; color: #FFF; font-size: 140%; padding: 10px 15px; }
    ul#nav { margin-top: 20px; width: 100%; }
    ul#nav li { float: left; list-style: none; margin: 0 10px 5px 0; }
    ul#nav li a { border-radius: 10px; box-shadow: 0 1px 2px rgba(0,0,0,.5); display: block; padding: 5px 15px; }
    ul#nav li.on a { background: #EEE; }
    ul#nav li.off a { background: #DDD; }
    div#nav_end { clear: both; }
    div#body { background: #DDD; border-radius: 10px; color: #222; padding: 15px; }
    div#body hr { margin: 10px 0 20px; }
    div#body input#url, div#body textarea#html { padding: 2px 5px; width: 90%; }
    div#body p.center { margin-top: 20px; text-align: center; }
    table#result, table#text { border-collapse: separate; border-spacing: 2px; }
    table#result tr.content { background: #FFF; }
    table#result tr.non-content { background: #EEE; color: #444; }
    table#result th { background: #666; color: #FFF; padding: 2px 5px; }
    table#result th.id, table#text th { text-align: right; vertical-align: top; }
    table#result td, table#text td { padding: 2px 5px; }
    table#result td.number { text-align: right; }
    table#text td { background: #FFF; }
    td.text span.tag { color: #080; }
    td.text span.text { color: #222; }
    td.text span.invisible { color: #00A; }
"#;

/// Document chrome shared by every response page.
#[derive(Debug, Clone)]
pub struct PageTemplate {
    pub title: String,
    pub stylesheet: String,
    /// Navigation labels for the URL, file and HTML forms.
    pub nav_labels: [String; 3],
    pub url_prompt: String,
    pub file_prompt: String,
    pub html_prompt: String,
    pub submit_label: String,
    pub success_caption: String,
    pub failure_caption: String,
}

impl Default for PageTemplate {
    fn default() -> Self {
        Self::for_kind(ExtractionKind::Content)
    }
}

impl PageTemplate {
    /// Default chrome for the given extraction front end.
    pub fn for_kind(kind: ExtractionKind) -> Self {
        let title = match kind {
            ExtractionKind::Content => "HTML Text Extraction (CETR)",
            ExtractionKind::Text => "HTML Text Extraction",
        };
        Self {
            title: title.to_string(),
            stylesheet: STYLESHEET.to_string(),
            nav_labels: ["Enter a URL", "Upload a file", "Paste HTML"].map(String::from),
            url_prompt: "Downloads the HTML at the given URL and extracts its text.".to_string(),
            file_prompt: "Extracts text from the uploaded HTML file.".to_string(),
            html_prompt: "Extracts text from the given HTML.".to_string(),
            submit_label: "Extract".to_string(),
            success_caption: "Text extraction succeeded.".to_string(),
            failure_caption: "Text extraction failed.".to_string(),
        }
    }

    /// Page showing the selected input form.
    pub fn form_page(&self, form: InputForm) -> String {
        let body = match form {
            InputForm::Url => format!(
                "  <div id=\"body\">\n   <form id=\"extract\" method=\"get\" action=\"\">\n    {}\n    <hr>\n\
                 \x20   <p class=\"center\"><input type=\"text\" id=\"url\" name=\"url\"></p>\n{}   </form>\n  </div>\n",
                escape(self.url_prompt.as_str()),
                self.submit_button()
            ),
            InputForm::File => format!(
                "  <div id=\"body\">\n   <form id=\"extract\" method=\"post\" action=\"\" enctype=\"multipart/form-data\">\n\
                 \x20   {}\n    <hr>\n    <p class=\"center\"><input type=\"file\" id=\"file\" name=\"file\"></p>\n{}   </form>\n  </div>\n",
                escape(self.file_prompt.as_str()),
                self.submit_button()
            ),
            InputForm::Html => format!(
                "  <div id=\"body\">\n   <form id=\"extract\" method=\"post\" action=\"\" enctype=\"multipart/form-data\">\n\
                 \x20   {}\n    <hr>\n    <p class=\"center\"><textarea id=\"html\" name=\"html\" rows=\"12\"></textarea></p>\n{}   </form>\n  </div>\n",
                escape(self.html_prompt.as_str()),
                self.submit_button()
            ),
        };
        self.document(form, &body)
    }

    /// Page wrapping a rendered report table.
    pub fn result_page(&self, form: InputForm, report: &str) -> String {
        let body = format!(
            "  <div id=\"body\">\n   {}\n   <hr>\n{report}  </div>\n",
            escape(self.success_caption.as_str())
        );
        self.document(form, &body)
    }

    /// Page showing a single error message.
    pub fn error_page(&self, form: InputForm, message: &str) -> String {
        let body = format!(
            "  <div id=\"body\">\n   {}\n   <hr>\n   <p>\n    {}\n   </p>\n  </div>\n",
            escape(self.failure_caption.as_str()),
            escape(message)
        );
        self.document(form, &body)
    }

    fn submit_button(&self) -> String {
        format!(
            "    <p class=\"center\"><input type=\"submit\" id=\"submit\" value=\"{}\"></p>\n",
            escape(self.submit_label.as_str())
        )
    }

    fn navigation(&self, selected: InputForm) -> String {
        let mut nav = String::from("  <ul id=\"nav\">\n");
        for (form, label) in InputForm::ALL.iter().zip(&self.nav_labels) {
            let state = if *form == selected { "on" } else { "off" };
            nav.push_str(&format!(
                "   <li class=\"{state}\"><a href=\"?form={}\">{}</a></li>\n",
                form.as_str(),
                escape(label.as_str())
            ));
        }
        nav.push_str("  </ul>\n  <div id=\"nav_end\"></div>\n");
        nav
    }

    fn document(&self, selected: InputForm, body: &str) -> String {
        let title = escape(self.title.as_str());
        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n <head>\n  <meta charset=\"utf-8\">\n  <title>{title}</title>\n\
             \x20 <style>{}</style>\n </head>\n <body>\n  <h1 id=\"title\">{title}</h1>\n{}{body} </body>\n</html>\n",
            self.stylesheet,
            self.navigation(selected)
        )
    }
}
