//! Load pipeline tests against EPUB archives built in memory.

mod common;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::{EpubBuilder, paragraphs};
use marginalia::io::{ArchiveReader, MemoryArchive, ZipArchiveReader};
use marginalia::segment::{MARKER_CLASS, markers};
use marginalia::{Error, ReaderConfig, load_book};

fn open(data: Vec<u8>) -> ZipArchiveReader<std::io::Cursor<Vec<u8>>> {
    ZipArchiveReader::from_bytes(data).unwrap()
}

#[test]
fn test_twelve_thousand_chars_two_markers_before_final_block() {
    let epub = EpubBuilder::new("Long").chapter("ch1.xhtml", &paragraphs(12, 1000)).build();
    let mut archive = open(epub);
    let book = load_book(&mut archive, &ReaderConfig::default()).unwrap();

    assert_eq!(book.segmentation.total_chars, 12000);
    let found = &book.segmentation.markers;
    assert_eq!(found.len(), 2);

    let dom = book.document.dom();
    let blocks: Vec<_> = dom
        .children(book.document.body())
        .filter(|&id| dom.is_tag(id, "p"))
        .collect();
    let parents: Vec<_> = found.iter().map(|&m| dom.parent(m).unwrap()).collect();
    assert_ne!(parents[0], parents[1]);
    let last = *blocks.last().unwrap();
    for parent in parents {
        assert!(blocks.contains(&parent));
        assert_ne!(parent, last);
    }
    assert_eq!(markers(&book.document), *found);
}

#[test]
fn test_content_marker_class_does_not_stop_segmentation() {
    let body = format!(
        r#"<div class="summary-marker">ornament</div>{}"#,
        paragraphs(12, 1000)
    );
    let epub = EpubBuilder::new("Ornate").chapter("ch1.xhtml", &body).build();
    let mut archive = open(epub);
    let book = load_book(&mut archive, &ReaderConfig::default()).unwrap();

    assert_eq!(book.segmentation.total_chars, 12008);
    let found = &book.segmentation.markers;
    assert_eq!(found.len(), 2);

    let dom = book.document.dom();
    let body = book.document.body();
    let ornament = dom.children(body).next().unwrap();
    assert!(!found.contains(&ornament));
    let parents: Vec<_> = found.iter().map(|&m| dom.parent(m).unwrap()).collect();
    assert_ne!(parents[0], parents[1]);
    assert!(parents.iter().all(|&p| p != body && dom.is_tag(p, "p")));
    assert_eq!(markers(&book.document), *found);
}

#[test]
fn test_chapters_assembled_in_spine_order_without_head() {
    let epub = EpubBuilder::new("Order")
        .chapter("b.xhtml", "<p>first</p>")
        .chapter("a.xhtml", "<p>second</p>")
        .build();
    let mut archive = open(epub);
    let book = load_book(&mut archive, &ReaderConfig::default()).unwrap();

    assert_eq!(book.package.metadata.title, "Order");
    assert_eq!(
        book.package.content_paths,
        vec!["OEBPS/text/b.xhtml", "OEBPS/text/a.xhtml"]
    );
    assert_eq!(book.document.body_html(), "<p>first</p><p>second</p>");
    assert_eq!(book.report.documents, 2);
}

#[test]
fn test_images_are_inlined_relative_to_the_chapter() {
    let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A];
    let epub = EpubBuilder::new("Pics")
        .chapter(
            "ch1.xhtml",
            r#"<p><img src="../images/fig1.png" alt="one"/><img src="/OEBPS/images/fig2.gif"/><img src="gone.jpg"/></p>"#,
        )
        .entry("OEBPS/images/fig1.png", &png)
        .entry("OEBPS/images/fig2.gif", b"GIF89a")
        .build();
    let mut archive = open(epub);
    let book = load_book(&mut archive, &ReaderConfig::default()).unwrap();
    let html = book.document.body_html();

    assert!(html.contains(&format!(r#"src="data:image/png;base64,{}""#, STANDARD.encode(png))));
    assert!(html.contains(&format!(r#"src="data:image/gif;base64,{}""#, STANDARD.encode(b"GIF89a"))));
    assert!(html.contains(r#"src="gone.jpg""#));
    assert_eq!(book.report.images_inlined, 2);
    assert_eq!(book.report.missing_images, vec!["OEBPS/text/gone.jpg"]);
}

#[test]
fn test_missing_content_document_is_skipped() {
    let mut archive = MemoryArchive::new()
        .with_entry("META-INF/container.xml", common::CONTAINER)
        .with_entry(
            "OEBPS/content.opf",
            r#"<package><manifest>
                 <item id="a" href="a.xhtml" media-type="application/xhtml+xml"/>
                 <item id="b" href="b.xhtml" media-type="application/xhtml+xml"/>
               </manifest><spine><itemref idref="a"/><itemref idref="b"/></spine></package>"#,
        )
        .with_entry("OEBPS/b.xhtml", "<html><body><p>only b</p></body></html>");
    assert!(!archive.contains("OEBPS/a.xhtml"));

    let book = load_book(&mut archive, &ReaderConfig::default()).unwrap();
    assert_eq!(book.report.skipped_documents, vec!["OEBPS/a.xhtml"]);
    assert_eq!(book.document.body_html(), "<p>only b</p>");
}

#[test]
fn test_missing_container_is_malformed() {
    let mut archive = MemoryArchive::new().with_entry("OEBPS/content.opf", "<package/>");
    assert!(matches!(
        load_book(&mut archive, &ReaderConfig::default()),
        Err(Error::MalformedArchive(_))
    ));
}

#[test]
fn test_empty_manifest_is_malformed() {
    let mut archive = MemoryArchive::new()
        .with_entry("META-INF/container.xml", common::CONTAINER)
        .with_entry("OEBPS/content.opf", "<package><manifest/><spine/></package>");
    assert!(matches!(
        load_book(&mut archive, &ReaderConfig::default()),
        Err(Error::MalformedArchive(_))
    ));
}

#[test]
fn test_book_without_content_is_malformed() {
    let epub = EpubBuilder::new("Empty").chapter("ch1.xhtml", "").build();
    let mut archive = open(epub);
    assert!(matches!(
        load_book(&mut archive, &ReaderConfig::default()),
        Err(Error::MalformedArchive(_))
    ));
}

#[test]
fn test_not_a_zip_is_malformed() {
    assert!(matches!(
        ZipArchiveReader::from_bytes(b"definitely not a zip".to_vec()),
        Err(Error::MalformedArchive(_))
    ));
}

#[test]
fn test_custom_interval_from_config() {
    let epub = EpubBuilder::new("Short").chapter("ch1.xhtml", &paragraphs(10, 100)).build();
    let mut archive = open(epub);
    let config = ReaderConfig::from_toml_str("summary_interval = 250").unwrap();
    let book = load_book(&mut archive, &config).unwrap();

    // Crossings at 300, 500, 800 and 1000 characters
    assert_eq!(book.segmentation.markers.len(), 4);
    assert_eq!(
        book.document.body_html().matches(MARKER_CLASS).count(),
        4
    );
}
