//! Shared fixtures: EPUBs built in memory and a scripted generation client.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{Cursor, Write};
use std::rc::Rc;

use async_trait::async_trait;
use marginalia::annotate::{
    AnnotationCache, AnnotationService, Definition, GenerationClient, GenerationRequest,
    KeyValueStore, MemoryStore,
};
use marginalia::{Error, ReaderConfig, Result};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const CONTAINER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Builds a minimal EPUB: chapters under `OEBPS/text/`, any extra entries
/// (images) at the paths given.
#[derive(Default)]
pub struct EpubBuilder {
    title: String,
    chapters: Vec<(String, String)>,
    extra: Vec<(String, Vec<u8>)>,
}

impl EpubBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    /// Add a chapter whose body is `body`.
    pub fn chapter(mut self, name: &str, body: &str) -> Self {
        self.chapters.push((name.to_string(), body.to_string()));
        self
    }

    pub fn entry(mut self, path: &str, data: &[u8]) -> Self {
        self.extra.push((path.to_string(), data.to_vec()));
        self
    }

    fn opf(&self) -> String {
        let mut manifest = String::new();
        let mut spine = String::new();
        for (i, (name, _)) in self.chapters.iter().enumerate() {
            manifest.push_str(&format!(
                r#"<item id="ch{i}" href="text/{name}" media-type="application/xhtml+xml"/>"#
            ));
            spine.push_str(&format!(r#"<itemref idref="ch{i}"/>"#));
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>{}</dc:title>
    <dc:creator>Test Author</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>{manifest}</manifest>
  <spine>{spine}</spine>
</package>"#,
            self.title
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();
        zip.start_file("META-INF/container.xml", deflated).unwrap();
        zip.write_all(CONTAINER.as_bytes()).unwrap();
        zip.start_file("OEBPS/content.opf", deflated).unwrap();
        zip.write_all(self.opf().as_bytes()).unwrap();

        for (name, body) in &self.chapters {
            zip.start_file(format!("OEBPS/text/{name}"), deflated).unwrap();
            let doc = format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml"><head><title>{name}</title><style>p {{ margin: 0 }}</style></head>
<body>{body}</body></html>"#
            );
            zip.write_all(doc.as_bytes()).unwrap();
        }
        for (path, data) in &self.extra {
            zip.start_file(path.as_str(), deflated).unwrap();
            zip.write_all(data).unwrap();
        }

        zip.finish().unwrap().into_inner()
    }
}

/// `count` paragraphs of `chars_each` letters each.
pub fn paragraphs(count: usize, chars_each: usize) -> String {
    (0..count)
        .map(|i| {
            let letter = char::from(b'a' + (i % 26) as u8);
            format!("<p>{}</p>", letter.to_string().repeat(chars_each))
        })
        .collect()
}

/// Replays canned answers in order and counts calls.
pub struct ScriptedClient {
    answers: RefCell<VecDeque<Result<String>>>,
    pub calls: Rc<Cell<usize>>,
    pub prompts: Rc<RefCell<Vec<String>>>,
}

impl ScriptedClient {
    pub fn new(answers: Vec<Result<String>>) -> Self {
        Self {
            answers: RefCell::new(answers.into()),
            calls: Rc::new(Cell::new(0)),
            prompts: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

#[async_trait(?Send)]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        self.prompts
            .borrow_mut()
            .push(request.messages[0].content.clone());
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(Error::GenerationFailure("no answer scripted".into())))
    }
}

/// Fails every request, but only after writing its entries into the shared
/// cache, the way a second reader finishing first would.
pub struct LateWriterClient {
    cache: AnnotationCache,
    summary: Option<String>,
    definition: Option<(String, Definition)>,
    pub calls: Rc<Cell<usize>>,
}

impl LateWriterClient {
    pub fn new(cache: AnnotationCache) -> Self {
        Self {
            cache,
            summary: None,
            definition: None,
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Summary stored for whatever section the request asks about.
    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    pub fn with_definition(mut self, word: &str, definition: &str, example: &str) -> Self {
        self.definition = Some((
            word.to_string(),
            Definition {
                definition: definition.to_string(),
                example: example.to_string(),
            },
        ));
        self
    }
}

#[async_trait(?Send)]
impl GenerationClient for LateWriterClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.set(self.calls.get() + 1);
        let prompt = &request.messages[0].content;
        match prompt.split_once("\n\n") {
            Some((lead, text)) if lead.starts_with("Summarize") => {
                if let Some(summary) = &self.summary {
                    self.cache.put_summary(text, summary)?;
                }
            }
            _ => {
                if let Some((word, definition)) = &self.definition {
                    self.cache.put_definition(word, definition)?;
                }
            }
        }
        Err(Error::GenerationFailure("connection reset".into()))
    }
}

/// Service whose client writes the cache and then fails, sharing one
/// in-memory store.
pub fn late_writer_harness(
    config: &ReaderConfig,
    build: impl FnOnce(LateWriterClient) -> LateWriterClient,
) -> Harness {
    let store = Rc::new(MemoryStore::new());
    let shared: Rc<dyn KeyValueStore> = store.clone();
    let client = build(LateWriterClient::new(AnnotationCache::new(
        shared.clone(),
        config.summary_key_prefix,
    )));
    let calls = client.calls.clone();
    let cache = AnnotationCache::new(shared, config.summary_key_prefix);
    Harness {
        service: AnnotationService::new(Box::new(client), cache, config.clone()),
        store,
        calls,
        prompts: Rc::new(RefCell::new(Vec::new())),
    }
}

/// Service over an in-memory store, plus handles to observe it.
pub struct Harness {
    pub service: AnnotationService,
    pub store: Rc<MemoryStore>,
    pub calls: Rc<Cell<usize>>,
    pub prompts: Rc<RefCell<Vec<String>>>,
}

pub fn harness(answers: Vec<Result<String>>, config: &ReaderConfig) -> Harness {
    let client = ScriptedClient::new(answers);
    let calls = client.calls.clone();
    let prompts = client.prompts.clone();
    let store = Rc::new(MemoryStore::new());
    let shared: Rc<dyn KeyValueStore> = store.clone();
    let cache = AnnotationCache::new(shared, config.summary_key_prefix);
    Harness {
        service: AnnotationService::new(Box::new(client), cache, config.clone()),
        store,
        calls,
        prompts,
    }
}
