use lopdf::Document;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use walkdir::WalkDir;

use crate::domain::{split_text, Chunk, DomainError, Locator};

/// Page separator emitted by PDF-to-text converters.
pub const PAGE_BREAK: char = '\u{0c}';

/// Turns a directory of text, markdown and PDF documents into overlapping
/// chunks.
pub struct CorpusIngestor {
    chunk_size: usize,
    chunk_overlap: usize,
    extensions: Vec<String>,
}

impl CorpusIngestor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            extensions: vec!["txt".to_string(), "md".to_string(), "pdf".to_string()],
        }
    }

    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Documents under `dir` with a known extension, in sorted order.
    pub fn discover(&self, dir: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable corpus entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.accepts(path))
            .collect();
        paths.sort();
        paths
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// Ingests every document under `dir`. A missing or empty directory
    /// yields no chunks; deciding whether that is fatal is up to the caller.
    #[instrument(skip(self, dir), fields(dir = %dir.display()))]
    pub fn ingest_dir(&self, dir: &Path) -> Vec<Chunk> {
        if !dir.is_dir() {
            warn!("corpus directory does not exist");
            return Vec::new();
        }

        let paths = self.discover(dir);
        if paths.is_empty() {
            warn!("no documents found in corpus directory");
            return Vec::new();
        }
        info!(documents = paths.len(), "found corpus documents");

        self.ingest_with_root(Some(dir), &paths)
    }

    pub fn ingest_paths(&self, paths: &[PathBuf]) -> Vec<Chunk> {
        self.ingest_with_root(None, paths)
    }

    fn ingest_with_root(&self, root: Option<&Path>, paths: &[PathBuf]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for path in paths {
            let source = source_label(root, path);
            match self.ingest_document(path, &source) {
                Ok(doc_chunks) => {
                    info!(source = %source, chunks = doc_chunks.len(), "document ingested");
                    chunks.extend(doc_chunks);
                }
                Err(e) => warn!(source = %source, error = %e, "skipping document"),
            }
        }
        info!(chunks = chunks.len(), "ingestion finished");
        chunks
    }

    pub fn ingest_document(&self, path: &Path, source: &str) -> Result<Vec<Chunk>, DomainError> {
        if is_pdf(path) {
            let pages = pdf_pages(path, source)?;
            return Ok(self.chunk_pages(source, pages.iter().map(String::as_str)));
        }
        let content =
            fs::read_to_string(path).map_err(|e| DomainError::ingestion(source, e.to_string()))?;
        Ok(self.chunk_document(source, &content))
    }

    /// Splits each form-feed separated page on its own so every chunk keeps an
    /// exact page locator.
    pub fn chunk_document(&self, source: &str, content: &str) -> Vec<Chunk> {
        self.chunk_pages(source, content.split(PAGE_BREAK))
    }

    fn chunk_pages<'a>(&self, source: &str, pages: impl Iterator<Item = &'a str>) -> Vec<Chunk> {
        pages
            .enumerate()
            .flat_map(|(page, text)| {
                split_text(text, self.chunk_size, self.chunk_overlap)
                    .into_iter()
                    .map(move |piece| Chunk::new(piece, source, Locator::Page(page)))
            })
            .collect()
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Text of every page in document order. Any page that fails to decode
/// rejects the whole document.
fn pdf_pages(path: &Path, source: &str) -> Result<Vec<String>, DomainError> {
    let doc = Document::load(path).map_err(|e| DomainError::ingestion(source, e.to_string()))?;
    doc.get_pages()
        .into_keys()
        .map(|number| {
            doc.extract_text(&[number])
                .map_err(|e| DomainError::ingestion(source, format!("page {number}: {e}")))
        })
        .collect()
}

fn source_label(root: Option<&Path>, path: &Path) -> String {
    root.and_then(|root| path.strip_prefix(root).ok())
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use tempfile::TempDir;

    fn ingestor() -> CorpusIngestor {
        CorpusIngestor::new(120, 20)
    }

    fn write_pdf(path: &Path, pages: &[&str]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_missing_directory_yields_no_chunks() {
        let dir = TempDir::new().unwrap();
        assert!(ingestor().ingest_dir(&dir.path().join("nope")).is_empty());
    }

    #[test]
    fn test_empty_directory_yields_no_chunks() {
        let dir = TempDir::new().unwrap();
        assert!(ingestor().ingest_dir(dir.path()).is_empty());
    }

    #[test]
    fn test_pages_become_locators() {
        let chunks = ingestor().chunk_document(
            "maths_ch4.txt",
            "Quadratic equations.\u{0c}The quadratic formula.\u{0c}\u{0c}Roots.",
        );

        let locators: Vec<_> = chunks.iter().map(|c| c.locator.clone()).collect();
        assert_eq!(
            locators,
            vec![Locator::Page(0), Locator::Page(1), Locator::Page(3)]
        );
        assert!(chunks.iter().all(|c| c.source == "maths_ch4.txt"));
    }

    #[test]
    fn test_ingest_dir_walks_recursively_and_filters_extensions() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("physics")).unwrap();
        fs::write(dir.path().join("maths.txt"), "Algebra basics.").unwrap();
        fs::write(dir.path().join("physics/light.md"), "Reflection of light.").unwrap();
        fs::write(dir.path().join("notes.docx"), "binary").unwrap();

        let chunks = ingestor().ingest_dir(dir.path());
        let sources: Vec<_> = chunks.iter().map(|c| c.source.clone()).collect();
        let light = Path::new("physics").join("light.md");

        assert_eq!(
            sources,
            vec!["maths.txt".to_string(), light.to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn test_unreadable_document_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a_bad.txt"), [0xff, 0xfe, 0xfd]).unwrap();
        fs::write(dir.path().join("b_good.txt"), "Chemical reactions.").unwrap();

        let chunks = ingestor().ingest_dir(dir.path());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, "b_good.txt");
    }

    #[test]
    fn test_ingest_document_reports_ingestion_error() {
        let dir = TempDir::new().unwrap();
        let err = ingestor()
            .ingest_document(&dir.path().join("missing.txt"), "missing.txt")
            .unwrap_err();
        assert!(matches!(err, DomainError::Ingestion { .. }));
    }

    #[test]
    fn test_long_document_is_chunked_with_bounded_size() {
        let text = "Light reflects off mirrors. ".repeat(40);
        let chunks = ingestor().chunk_document("light.txt", &text);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 120));
    }

    #[test]
    fn test_pdf_yields_one_unit_per_page() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("optics.pdf");
        write_pdf(&path, &["Snell law relates angles.", "Total internal reflection."]);

        let chunks = ingestor().ingest_document(&path, "optics.pdf").unwrap();

        let locators: Vec<_> = chunks.iter().map(|c| c.locator.clone()).collect();
        assert_eq!(locators, vec![Locator::Page(0), Locator::Page(1)]);
        assert!(chunks[0].text.contains("Snell law"));
        assert!(chunks[1].text.contains("internal reflection"));
        assert!(chunks.iter().all(|c| c.source == "optics.pdf"));
    }

    #[test]
    fn test_corrupt_pdf_is_ingestion_error_and_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a_broken.pdf"), "not a pdf at all").unwrap();
        write_pdf(&dir.path().join("b_lenses.pdf"), &["Convex lenses converge light."]);

        let err = ingestor()
            .ingest_document(&dir.path().join("a_broken.pdf"), "a_broken.pdf")
            .unwrap_err();
        assert!(matches!(err, DomainError::Ingestion { .. }));

        let chunks = ingestor().ingest_dir(dir.path());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, "b_lenses.pdf");
        assert_eq!(chunks[0].locator, Locator::Page(0));
    }
}
