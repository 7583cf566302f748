use std::path::Path;

use lopdf::Document;

use crate::error::AppError;

use super::PageText;

/// Extract text page by page. Page numbers in the result are zero-based.
pub(crate) fn load_pdf_pages(path: &Path) -> Result<Vec<PageText>, AppError> {
    let doc = Document::load(path).map_err(|e| {
        AppError::new("INGEST_LOAD_FAILED", "Failed to parse PDF document")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;

    let mut pages = Vec::new();
    for (page_no, _) in doc.get_pages() {
        let text = doc.extract_text(&[page_no]).map_err(|e| {
            AppError::new("INGEST_LOAD_FAILED", "Failed to extract PDF page text")
                .with_details(format!("path={}; page={}; err={}", path.display(), page_no, e))
        })?;
        pages.push(PageText {
            page: Some(page_no.saturating_sub(1)),
            text,
        });
    }
    Ok(pages)
}
