use crate::Assets;
use paperchef_models::{AppError, DocumentSummary};

const RESULT_SLOT: &str = "<!-- result -->";

const FALLBACK_PAGE: &str = "<!DOCTYPE html><html><head><title>paperchef</title></head><body>\
<form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\
<input type=\"file\" name=\"file\"><button type=\"submit\">Upload</button></form>\
<!-- result --></body></html>";

pub enum PageView<'a> {
    Empty,
    Summary(&'a DocumentSummary),
    Failure(&'a AppError),
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn summary_fragment(summary: &DocumentSummary) -> String {
    let heading = match &summary.filename {
        Some(name) => format!("Result for {}", escape_html(name)),
        None => "Result".to_string(),
    };
    format!(
        "<section class=\"result\">\n  <h2>{}</h2>\n  <dl>\n    \
         <dt>Title</dt><dd>{}</dd>\n    \
         <dt>Author</dt><dd>{}</dd>\n    \
         <dt>Summary</dt><dd>{}</dd>\n  </dl>\n</section>",
        heading,
        escape_html(&summary.title),
        escape_html(&summary.author),
        escape_html(&summary.summary),
    )
}

fn failure_fragment(error: &AppError) -> String {
    format!(
        "<section class=\"error\">\n  <h2>Upload failed</h2>\n  <p>{}</p>\n</section>",
        escape_html(&error.to_string())
    )
}

pub fn render_page(view: PageView<'_>) -> String {
    let template = Assets::get("index.html")
        .map(|file| String::from_utf8_lossy(&file.data).into_owned())
        .unwrap_or_else(|| FALLBACK_PAGE.to_string());

    let fragment = match view {
        PageView::Empty => String::new(),
        PageView::Summary(summary) => summary_fragment(summary),
        PageView::Failure(error) => failure_fragment(error),
    };
    template.replacen(RESULT_SLOT, &fragment, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn empty_page_has_upload_form() {
        let page = render_page(PageView::Empty);
        assert!(page.contains("enctype=\"multipart/form-data\""));
        assert!(page.contains("name=\"file\""));
        assert!(!page.contains(RESULT_SLOT));
        assert!(!page.contains("class=\"result\""));
    }

    #[test]
    fn summary_is_escaped_into_page() {
        let summary = DocumentSummary {
            title: "Pasta <Basics>".to_string(),
            author: "A. Cook".to_string(),
            summary: "Boil water. Add salt. Cook pasta.".to_string(),
            filename: None,
        }
        .with_filename("pasta.pdf");

        let page = render_page(PageView::Summary(&summary));
        assert!(page.contains("Result for pasta.pdf"));
        assert!(page.contains("<dd>Pasta &lt;Basics&gt;</dd>"));
        assert!(page.contains("<dd>A. Cook</dd>"));
        assert!(page.contains("Boil water. Add salt. Cook pasta."));
    }

    #[test]
    fn failure_shows_message() {
        let err = AppError::invalid("multipart field 'file' is required");
        let page = render_page(PageView::Failure(&err));
        assert!(page.contains("Upload failed"));
        assert!(page.contains("multipart field &#39;file&#39; is required"));
    }
}
