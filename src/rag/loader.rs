//! Document loading.
//!
//! PDFs are read page by page with lopdf; pdf-extract is the fallback when
//! lopdf cannot recover any text from the page streams.

use std::path::Path;

use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Text of one page, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub text: String,
}

#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Vec<Page>, ApiError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfLoader;

impl PdfLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load(&self, path: &Path) -> Result<Vec<Page>, ApiError> {
        tracing::debug!("Extracting PDF: {}", path.display());
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            ApiError::Internal(format!("Failed to read {}: {}", path.display(), err))
        })?;

        tokio::task::spawn_blocking(move || extract_pages(&bytes))
            .await
            .map_err(|err| ApiError::Internal(format!("PDF task join error: {}", err)))?
    }
}

fn extract_pages(bytes: &[u8]) -> Result<Vec<Page>, ApiError> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|err| ApiError::Internal(format!("Invalid PDF: {}", err)))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => pages.push(Page {
                number: *page_number,
                text,
            }),
            Err(err) => {
                tracing::debug!("lopdf could not extract page {}: {}", page_number, err);
            }
        }
    }

    let pages = drop_blank_pages(pages);
    if !pages.is_empty() {
        return Ok(pages);
    }

    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|err| ApiError::Internal(format!("PDF extraction failed: {}", err)))?;
    Ok(drop_blank_pages(vec![Page { number: 1, text }]))
}

fn drop_blank_pages(pages: Vec<Page>) -> Vec<Page> {
    pages
        .into_iter()
        .filter(|page| !page.text.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Builds a PDF with one Courier text line per page.
    fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
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

        let mut kids: Vec<Object> = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn pages_keep_their_numbers_and_skip_blank_ones() {
        let bytes = pdf_with_pages(&["Diagnostico cantonal", "   ", "Propuesta territorial"]);

        let pages = extract_pages(&bytes).unwrap();
        let numbers: Vec<u32> = pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert!(pages[0].text.contains("Diagnostico"));
        assert!(pages[1].text.contains("Propuesta"));
    }

    #[tokio::test]
    async fn loader_reads_pdf_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("PDOT_Pindal.pdf");
        std::fs::write(&path, pdf_with_pages(&["Plan de Pindal"])).unwrap();

        let pages = PdfLoader::new().load(&path).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 1);
        assert!(pages[0].text.contains("Pindal"));
    }

    #[test]
    fn blank_pages_are_dropped() {
        let pages = drop_blank_pages(vec![
            Page { number: 1, text: "Diagnóstico".to_string() },
            Page { number: 2, text: " \n\t ".to_string() },
            Page { number: 3, text: "Propuesta".to_string() },
        ]);
        let numbers: Vec<u32> = pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(extract_pages(b"definitely not a pdf").is_err());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = PdfLoader::new().load(&tmp.path().join("nope.pdf")).await;
        assert!(result.is_err());
    }
}
