//! Text layer extraction for PDF soil reports using lopdf and pdf-extract.

use std::fs;
use std::path::Path;

use lopdf::Document;
use tracing::debug;

use crate::error::PdfError;

/// Whether `path` has a `.pdf` extension, ignoring case.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Embedded text of a loaded PDF report.
pub struct PdfTextExtractor {
    raw_data: Vec<u8>,
    page_count: usize,
}

impl PdfTextExtractor {
    /// Read and load the PDF at `path`.
    pub fn open(path: &Path) -> Result<Self, PdfError> {
        let data = fs::read(path).map_err(PdfError::Read)?;
        Self::load(&data)
    }

    /// Load a PDF from memory. Documents encrypted with an empty password
    /// are decrypted first.
    pub fn load(data: &[u8]) -> Result<Self, PdfError> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {e}")))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }
        debug!(page_count, "Loaded PDF");

        Ok(Self {
            raw_data,
            page_count,
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Text of every page, in page order. Scanned pages without a text layer
    /// contribute nothing.
    pub fn text(&self) -> Result<String, PdfError> {
        let text = pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        debug!(chars = text.len(), "Extracted PDF text layer");
        Ok(text)
    }
}

/// One-page PDF with each of `lines` on its own text line.
#[cfg(test)]
pub(crate) fn text_pdf(lines: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
    ];
    for (index, line) in lines.iter().enumerate() {
        if index > 0 {
            operations.push(Operation::new("Td", vec![0.into(), (-20).into()]));
        }
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut data = Vec::new();
    doc.save_to(&mut data).unwrap();
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("card.pdf")));
        assert!(is_pdf(Path::new("/scans/CARD.PDF")));
        assert!(!is_pdf(Path::new("card.png")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    #[test]
    fn test_extracts_text_layer() {
        let data = text_pdf(&["pH Level: 6.5", "Zinc: 1.2 mg/kg"]);
        let extractor = PdfTextExtractor::load(&data).unwrap();

        assert_eq!(extractor.page_count(), 1);
        let text = extractor.text().unwrap();
        assert!(text.contains("pH Level: 6.5"), "{text:?}");
        assert!(text.contains("Zinc: 1.2 mg/kg"), "{text:?}");
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = PdfTextExtractor::load(b"%PDF-1.4 truncated").err().unwrap();
        assert!(matches!(err, PdfError::Parse(_)), "got {err:?}");
        assert!(err.to_string().starts_with("Failed to read PDF: "));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = PdfTextExtractor::open(Path::new("/nonexistent/card.pdf")).err().unwrap();
        assert!(matches!(err, PdfError::Read(_)));
    }
}
