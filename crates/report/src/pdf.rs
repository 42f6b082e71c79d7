//! PDF text extraction.

use crate::error::{ReportError, ReportResult};

/// Turns document bytes into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> ReportResult<String>;
}

/// Extractor for digital PDFs with an embedded text layer, backed by `pdf-extract`.
///
/// Scanned reports without a text layer come back as empty or whitespace-only text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> ReportResult<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ReportError::PdfParsing(e.to_string()))
    }
}

/// Whether `filename` carries a `.pdf` extension, ignoring case.
pub fn has_pdf_extension(filename: &str) -> bool {
    filename.trim().to_ascii_lowercase().ends_with(".pdf")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a single-page PDF whose content stream shows each of `lines` on its own row.
    pub(crate) fn make_test_pdf(lines: &[&str]) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut content = String::from("BT /F1 12 Tf 72 720 Td 14 TL");
        for line in lines {
            content.push_str(&format!(" ({line}) Tj T*"));
        }
        content.push_str(" ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let resources = dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        };

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_extract_text_from_digital_pdf() {
        let bytes = make_test_pdf(&["Lipid Panel", "LDL Cholesterol 145 mg/dL"]);
        let text = PdfTextExtractor.extract_text(&bytes).unwrap();
        assert!(
            text.contains("LDL") || text.contains("145"),
            "Expected extracted text to mention the LDL row, got: {text}"
        );
    }

    #[test]
    fn test_invalid_pdf_returns_error() {
        let err = PdfTextExtractor
            .extract_text(b"not a pdf")
            .expect_err("garbage should not parse");
        assert!(matches!(err, ReportError::PdfParsing(_)));
        assert_eq!(err.to_string(), "could not extract text from pdf");
    }

    #[test]
    fn test_pdf_extension_check() {
        assert!(has_pdf_extension("report.pdf"));
        assert!(has_pdf_extension("REPORT.PDF"));
        assert!(!has_pdf_extension("report.pdf.txt"));
        assert!(!has_pdf_extension("report"));
    }
}
