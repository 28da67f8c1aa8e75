pub mod json;
pub mod page;
pub mod report;

pub use json::{JsonConfig, convert_to_json};
pub use page::{InputForm, PageTemplate};
pub use report::{ReportConfig, ReportRenderer, render, render_content, render_text};
