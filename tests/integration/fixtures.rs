//! Shared helpers for the integration tests

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use pdf_harvest::browser::{BrowserBackend, Provenance, RenderedPage};
use pdf_harvest::config::Config;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::ResponseTemplate;

/// Serializes a one-page PDF whose link annotations point at `uris`
pub fn pdf_linking_to(uris: &[String]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![40.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("Reading list")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

    let annots: Vec<Object> = uris
        .iter()
        .map(|uri| {
            doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Link",
                "Rect" => vec![0.into(), 0.into(), 100.into(), 20.into()],
                "A" => dictionary! {
                    "S" => "URI",
                    "URI" => Object::String(uri.as_bytes().to_vec(), StringFormat::Literal),
                },
            })
            .into()
        })
        .collect();

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
        "Annots" => annots,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Writes a seed PDF linking to `uris` and returns its path
pub fn write_seed(dir: &Path, name: &str, uris: &[String]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, pdf_linking_to(uris)).unwrap();
    path
}

/// A 200 response carrying `body` as `application/pdf`
pub fn pdf_response(body: Vec<u8>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/pdf")
        .set_body_bytes(body)
}

pub fn html_response(html: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(html.to_string())
}

/// Configuration for fast, offline-friendly runs
pub fn test_config(out: &Path) -> Config {
    let mut config = Config::default();
    config.crawl.delay_ms = 0;
    config.render.enabled = false;
    config.cloud.browser_download = false;
    config.output.directory = out.to_path_buf();
    config.output.progress = false;
    config
}

/// Browser double whose page snapshots link to a fixed set of URLs
pub struct FakeBrowser {
    pub snapshot_links: Vec<String>,
    pub provenance: Provenance,
    pub renders: AtomicUsize,
    /// Written instead of a linking PDF when set
    pub snapshot_body: Option<Vec<u8>>,
}

impl FakeBrowser {
    pub fn new(snapshot_links: Vec<String>, provenance: Provenance) -> Self {
        Self {
            snapshot_links,
            provenance,
            renders: AtomicUsize::new(0),
            snapshot_body: None,
        }
    }

    /// A browser whose snapshots are not readable PDFs
    pub fn unreadable(provenance: Provenance) -> Self {
        Self {
            snapshot_body: Some(b"not a pdf at all".to_vec()),
            ..Self::new(Vec::new(), provenance)
        }
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserBackend for FakeBrowser {
    async fn render_page(&self, _url: &str, out_dir: &Path) -> anyhow::Result<RenderedPage> {
        let n = self.renders.fetch_add(1, Ordering::SeqCst);
        std::fs::create_dir_all(out_dir)?;
        let path = out_dir.join(format!("snapshot-{}.pdf", n));
        let body = match &self.snapshot_body {
            Some(bytes) => bytes.clone(),
            None => pdf_linking_to(&self.snapshot_links),
        };
        std::fs::write(&path, body)?;
        Ok(RenderedPage {
            path,
            provenance: self.provenance,
        })
    }

    async fn click_download(&self, _url: &str, _out_dir: &Path) -> anyhow::Result<PathBuf> {
        Err(anyhow::anyhow!("downloads are not scripted in tests"))
    }
}
