use std::fs;
use std::path::Path;

use harag_core::error::AppError;
use harag_core::ingest::DocumentLoader;
use lopdf::content::{Content, Operation};
use lopdf::dictionary;
use lopdf::{Document, Object, Stream};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

/// Write a PDF with one line of Courier text per page.
fn write_pdf(path: &Path, pages: &[&str]) {
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
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
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
fn loads_text_files_with_provenance() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("handbook.txt");
    fs::write(&path, "Paris is the capital of France.\r\n\r\nBerlin is the capital of Germany.").unwrap();

    let loader = DocumentLoader::new(40, 0);
    let corpus = loader.load_documents(&[path]).unwrap();

    assert_eq!(corpus.file_count, 1);
    assert!(corpus.skipped.is_empty());
    let texts: Vec<&str> = corpus.chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["Paris is the capital of France.", "Berlin is the capital of Germany."]
    );
    for (i, c) in corpus.chunks.iter().enumerate() {
        assert_eq!(c.source, "handbook.txt");
        assert_eq!(c.page, None);
        assert_eq!(c.ordinal, i as u32);
    }
}

#[test]
fn loads_pdf_pages_with_zero_based_page_numbers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    write_pdf(&path, &["Paris is the capital of France.", "Berlin is the capital of Germany."]);

    let corpus = DocumentLoader::new(1000, 200).load_documents(&[path]).unwrap();

    assert!(corpus.skipped.is_empty());
    let pages: Vec<(Option<u32>, &str)> = corpus.chunks.iter().map(|c| (c.page, c.text.as_str())).collect();
    assert_eq!(
        pages,
        vec![
            (Some(0), "Paris is the capital of France."),
            (Some(1), "Berlin is the capital of Germany."),
        ]
    );
    for (i, c) in corpus.chunks.iter().enumerate() {
        assert_eq!(c.source, "report.pdf");
        assert_eq!(c.ordinal, i as u32);
    }
}

#[test]
fn skips_bad_documents_and_keeps_the_rest() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.txt");
    let unsupported = dir.path().join("slides.pptx");
    let corrupt = dir.path().join("broken.pdf");
    let missing = dir.path().join("missing.txt");
    fs::write(&good, "Some useful text.").unwrap();
    fs::write(&unsupported, "binary").unwrap();
    fs::write(&corrupt, "this is not a pdf").unwrap();

    let corpus = DocumentLoader::default()
        .load_documents(&[good, unsupported, corrupt, missing])
        .unwrap();

    assert_eq!(corpus.file_count, 4);
    assert_eq!(corpus.chunks.len(), 1);
    assert_eq!(corpus.chunks[0].source, "good.txt");

    let codes: Vec<&str> = corpus.skipped.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(
        codes,
        vec!["INGEST_UNSUPPORTED_TYPE", "INGEST_LOAD_FAILED", "INGEST_FILE_NOT_FOUND"]
    );
}

#[test]
fn fails_when_no_document_survives() {
    let dir = tempdir().unwrap();
    let corrupt = dir.path().join("broken.pdf");
    let empty = dir.path().join("empty.txt");
    fs::write(&corrupt, "%PDF-garbage").unwrap();
    fs::write(&empty, "   \n\n ").unwrap();

    let err: AppError = DocumentLoader::default()
        .load_documents(&[corrupt, empty])
        .unwrap_err();
    assert_eq!(err.code, "INGEST_EMPTY");
}

#[test]
fn chunk_ids_are_stable_across_loads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "alpha beta gamma delta ".repeat(100)).unwrap();

    let loader = DocumentLoader::new(200, 50);
    let first = loader.load_documents(&[path.clone()]).unwrap();
    let second = loader.load_documents(&[path]).unwrap();

    assert!(first.chunks.len() > 1);
    let ids_a: Vec<&str> = first.chunks.iter().map(|c| c.chunk_id.as_str()).collect();
    let ids_b: Vec<&str> = second.chunks.iter().map(|c| c.chunk_id.as_str()).collect();
    assert_eq!(ids_a, ids_b);
}
