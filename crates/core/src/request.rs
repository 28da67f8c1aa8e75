//! Request surface of the front ends.
//!
//! A request carries one of `url`, `file` or `html`, or a `form` selector
//! naming the input form to show. Field names are checked in that order and
//! the first one present wins, even when its value is empty.

use crate::render::InputForm;

/// One extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractRequest {
    /// Fetch the URL and extract from the archived response.
    Url(String),
    /// Extract from an uploaded document.
    File(Vec<u8>),
    /// Extract from pasted HTML.
    Html(Vec<u8>),
    /// Show an input form; no extraction.
    Form(InputForm),
}

impl ExtractRequest {
    /// Builds a request from submitted form fields.
    ///
    /// Only the first value of a repeated field counts.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Vec<u8>>,
    {
        let mut url = None;
        let mut file = None;
        let mut html = None;
        let mut form = None;

        for (name, value) in fields {
            let slot = match name.as_ref() {
                "url" => &mut url,
                "file" => &mut file,
                "html" => &mut html,
                "form" => &mut form,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }

        if let Some(url) = url {
            Self::Url(String::from_utf8_lossy(&url).into_owned())
        } else if let Some(file) = file {
            Self::File(file)
        } else if let Some(html) = html {
            Self::Html(html)
        } else {
            let selector = form.map(|f| String::from_utf8_lossy(&f).into_owned()).unwrap_or_default();
            Self::Form(InputForm::from_selector(&selector))
        }
    }

    /// The input form this request came from.
    pub fn input_form(&self) -> InputForm {
        match self {
            Self::Url(_) => InputForm::Url,
            Self::File(_) => InputForm::File,
            Self::Html(_) => InputForm::Html,
            Self::Form(form) => *form,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_wins() {
        let request = ExtractRequest::from_fields([("html", "<p>x</p>"), ("url", "http://example.com"), ("file", "f")]);
        assert_eq!(request, ExtractRequest::Url("http://example.com".to_string()));
    }

    #[test]
    fn test_file_before_html() {
        let request = ExtractRequest::from_fields([("html", "<p>pasted</p>"), ("file", "<p>uploaded</p>")]);
        assert_eq!(request, ExtractRequest::File(b"<p>uploaded</p>".to_vec()));
        assert_eq!(request.input_form(), InputForm::File);
    }

    #[test]
    fn test_empty_value_still_wins() {
        let request = ExtractRequest::from_fields([("url", ""), ("html", "<p>x</p>")]);
        assert_eq!(request, ExtractRequest::Url(String::new()));
    }

    #[test]
    fn test_first_value_of_repeated_field() {
        let request = ExtractRequest::from_fields([("html", "first"), ("html", "second")]);
        assert_eq!(request, ExtractRequest::Html(b"first".to_vec()));
    }

    #[test]
    fn test_form_selector() {
        assert_eq!(ExtractRequest::from_fields([("form", "html")]), ExtractRequest::Form(InputForm::Html));
        assert_eq!(ExtractRequest::from_fields(Vec::<(&str, &str)>::new()), ExtractRequest::Form(InputForm::Url));
        assert_eq!(ExtractRequest::from_fields([("other", "x")]), ExtractRequest::Form(InputForm::Url));
    }
}
