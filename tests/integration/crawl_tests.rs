//! Integration tests for the harvester
//!
//! These tests use wiremock to serve synthetic link graphs of PDFs and
//! pages, and run full seed traversals against them.

mod fixtures;

use fixtures::{html_response, pdf_linking_to, pdf_response, test_config, write_seed, FakeBrowser};
use pdf_harvest::browser::{NoBrowser, Provenance};
use pdf_harvest::crawler::{harvest, Harvester};
use pdf_harvest::output::SeedReport;
use pdf_harvest::state::LinkState;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn harvester(config: pdf_harvest::Config) -> Harvester {
    Harvester::with_browser(config, Arc::new(NoBrowser)).expect("harvester")
}

#[tokio::test]
async fn test_depth_bound_stops_at_max_depth() {
    let server = MockServer::start().await;
    let base = server.uri();

    // d0 -> d1 -> d2 -> d3 -> d4, a chain two hops longer than max_depth
    for i in 0..5 {
        let next = vec![format!("{}/d{}.pdf", base, i + 1)];
        let expected = if i <= 2 { 1 } else { 0 };
        Mock::given(method("GET"))
            .and(path(format!("/d{}.pdf", i)))
            .respond_with(pdf_response(pdf_linking_to(&next)))
            .expect(expected)
            .mount(&server)
            .await;
    }

    let seeds = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let seed = write_seed(seeds.path(), "chain.pdf", &[format!("{}/d0.pdf", base)]);

    let mut config = test_config(out.path());
    config.crawl.max_depth = 2;
    let report = harvester(config).harvest_seed(&seed, out.path()).await;

    assert_eq!(report.counts.links_found, 1);
    assert_eq!(report.counts.attempted, 3);
    assert_eq!(report.counts.succeeded, 3);
    let depths: Vec<u32> = report.outcomes.iter().map(|o| o.depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);
    assert!(out.path().join("d2.pdf").exists());
    assert!(!out.path().join("d3.pdf").exists());

    server.verify().await;
}

#[tokio::test]
async fn test_shared_child_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let shared = format!("{}/shared.pdf", base);

    for name in ["a", "b"] {
        Mock::given(method("GET"))
            .and(path(format!("/{}.pdf", name)))
            .respond_with(pdf_response(pdf_linking_to(&[shared.clone()])))
            .expect(1)
            .mount(&server)
            .await;
    }
    // Links back to a parent, closing a cycle
    Mock::given(method("GET"))
        .and(path("/shared.pdf"))
        .respond_with(pdf_response(pdf_linking_to(&[format!("{}/a.pdf#page=2", base)])))
        .expect(1)
        .mount(&server)
        .await;

    let seeds = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let seed = write_seed(
        seeds.path(),
        "seed.pdf",
        &[format!("{}/a.pdf", base), format!("{}/b.pdf", base)],
    );

    let report = harvester(test_config(out.path()))
        .harvest_seed(&seed, out.path())
        .await;

    assert_eq!(report.counts.links_found, 2);
    assert_eq!(report.counts.attempted, 3);
    assert_eq!(report.count_state(LinkState::PdfDownloaded), 3);

    server.verify().await;
}

#[tokio::test]
async fn test_second_run_keeps_existing_files() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/notes.pdf"))
        .respond_with(pdf_response(pdf_linking_to(&[])))
        .mount(&server)
        .await;

    let seeds = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let seed = write_seed(seeds.path(), "seed.pdf", &[format!("{}/notes.pdf", base)]);
    let h = harvester(test_config(out.path()));

    let first = h.harvest_seed(&seed, out.path()).await;
    assert_eq!(first.counts.succeeded, 1);
    let saved = out.path().join("notes.pdf");
    std::fs::write(&saved, b"kept from first run").unwrap();

    let second = h.harvest_seed(&seed, out.path()).await;
    assert_eq!(second.counts.succeeded, 1);
    assert_eq!(std::fs::read(&saved).unwrap(), b"kept from first run");

    let files: Vec<_> = std::fs::read_dir(out.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(files.len(), 1);
}

#[tokio::test]
async fn test_content_sniffing() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/view.html"))
        .respond_with(pdf_response(pdf_linking_to(&[])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .and(query_param("token", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/octet-stream")
                .set_body_bytes(pdf_linking_to(&[])),
        )
        .mount(&server)
        .await;

    let seeds = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let seed = write_seed(
        seeds.path(),
        "seed.pdf",
        &[
            format!("{}/view.html", base),
            format!("{}/report.pdf?token=1", base),
        ],
    );

    let report = harvester(test_config(out.path()))
        .harvest_seed(&seed, out.path())
        .await;

    assert_eq!(report.counts.succeeded, 2);
    for outcome in &report.outcomes {
        assert_eq!(outcome.state, LinkState::PdfDownloaded, "{}", outcome.url);
        assert!(outcome.artifact.as_ref().unwrap().exists());
    }
}

#[tokio::test]
async fn test_cloud_viewer_with_confirm_page() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/file/d/BIG/view"))
        .respond_with(html_response("<html><body>Viewer</body></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uc"))
        .and(query_param("confirm", "t0k"))
        .respond_with(
            pdf_response(pdf_linking_to(&[]))
                .insert_header("content-disposition", "attachment; filename=\"lecture.pdf\""),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uc"))
        .and(query_param("id", "BIG"))
        .respond_with(html_response(
            r#"<p>Google Drive can't scan this file for viruses.</p>
               <a href="/uc?export=download&amp;confirm=t0k&amp;id=BIG">Download anyway</a>"#,
        ))
        .mount(&server)
        .await;

    let seeds = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let seed = write_seed(seeds.path(), "seed.pdf", &[format!("{}/file/d/BIG/view", base)]);

    let mut config = test_config(out.path());
    config.cloud.drive_hosts = vec!["127.0.0.1".to_string()];
    let report = harvester(config).harvest_seed(&seed, out.path()).await;

    assert_eq!(report.counts.attempted, 1);
    assert_eq!(report.counts.succeeded, 1);
    assert_eq!(report.outcomes[0].state, LinkState::CloudDocResolved);
    assert!(out.path().join("lecture.pdf").exists());

    server.verify().await;
}

#[tokio::test]
async fn test_generic_page_scrapes_and_follows_rendered_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/course"))
        .respond_with(html_response(
            r#"<html><head><title>Course</title></head><body>
                 <a href="/handout.pdf">Handout</a>
                 <iframe src="/embedded.pdf"></iframe>
                 <a href="/anchor-only">Not followed when a snapshot exists</a>
               </body></html>"#,
        ))
        .mount(&server)
        .await;
    for name in ["/handout.pdf", "/embedded.pdf", "/from-snapshot.pdf"] {
        Mock::given(method("GET"))
            .and(path(name))
            .respond_with(pdf_response(pdf_linking_to(&[])))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/anchor-only"))
        .respond_with(html_response("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let seeds = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let seed = write_seed(seeds.path(), "seed.pdf", &[format!("{}/course", base)]);

    let mut config = test_config(out.path());
    config.render.enabled = true;
    let browser = Arc::new(FakeBrowser::new(
        vec![format!("{}/from-snapshot.pdf", base)],
        Provenance::Printed,
    ));
    let report = Harvester::with_browser(config, browser.clone())
        .unwrap()
        .harvest_seed(&seed, out.path())
        .await;

    assert_eq!(browser.render_count(), 1);
    assert_eq!(report.counts.rendered, 1);
    // course page, two leaves, one child from the snapshot
    assert_eq!(report.counts.attempted, 4);
    assert_eq!(report.counts.succeeded, 3);
    assert_eq!(report.count_state(LinkState::GenericPageProcessed), 1);
    assert_eq!(report.renders[0].provenance, Provenance::Printed);

    server.verify().await;
}

/// Serves a page with one anchor and crawls it with `browser` rendering
///
/// `/next` is only reachable through the page's anchor and
/// `/from-snapshot.pdf` only through the snapshot; the expected hit counts
/// say which of the two sources the crawl followed.
async fn crawl_rendered_page(
    make_browser: impl FnOnce(String) -> FakeBrowser,
    anchor_hits: u64,
    snapshot_hits: u64,
) -> SeedReport {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/course"))
        .respond_with(html_response(r#"<a href="/next">Next week</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html_response("<html><body>week two</body></html>"))
        .expect(anchor_hits)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/from-snapshot.pdf"))
        .respond_with(pdf_response(pdf_linking_to(&[])))
        .expect(snapshot_hits)
        .mount(&server)
        .await;

    let seeds = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let seed = write_seed(seeds.path(), "seed.pdf", &[format!("{}/course", base)]);

    let mut config = test_config(out.path());
    config.render.enabled = true;
    let browser = Arc::new(make_browser(format!("{}/from-snapshot.pdf", base)));
    let report = Harvester::with_browser(config, browser)
        .unwrap()
        .harvest_seed(&seed, out.path())
        .await;

    server.verify().await;
    report
}

#[tokio::test]
async fn test_screenshot_snapshot_follows_page_anchors() {
    let report = crawl_rendered_page(|link| FakeBrowser::new(vec![link], Provenance::Screenshot), 1, 0).await;

    assert_eq!(report.renders[0].provenance, Provenance::Screenshot);
    assert_eq!(report.count_state(LinkState::GenericPageProcessed), 2);
}

#[tokio::test]
async fn test_unreadable_snapshot_falls_back_to_anchors() {
    let report = crawl_rendered_page(|_| FakeBrowser::unreadable(Provenance::Printed), 1, 0).await;

    assert_eq!(report.counts.rendered, 2);
    assert_eq!(report.count_state(LinkState::GenericPageProcessed), 2);
}

#[tokio::test]
async fn test_existing_snapshot_links_are_followed() {
    let report = crawl_rendered_page(|link| FakeBrowser::new(vec![link], Provenance::Existing), 0, 1).await;

    assert_eq!(report.renders[0].provenance, Provenance::Existing);
    assert_eq!(report.count_state(LinkState::PdfDownloaded), 1);
}

#[tokio::test]
async fn test_page_without_render_follows_anchors_and_caps_leaves() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(html_response(
            r#"<a href="/one.pdf">1</a><a href="/two.pdf">2</a><a href="/next">next</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/one.pdf"))
        .respond_with(pdf_response(pdf_linking_to(&[])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html_response("<html><body>end</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let seeds = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let seed = write_seed(seeds.path(), "seed.pdf", &[format!("{}/index", base)]);

    let mut config = test_config(out.path());
    config.crawl.max_links_per_page = Some(1);
    let report = harvester(config).harvest_seed(&seed, out.path()).await;

    // two.pdf is past the leaf cap; followed as an anchor it only gets a 404
    assert!(!out.path().join("two.pdf").exists());
    assert_eq!(report.counts.rendered, 0);
    assert_eq!(report.count_state(LinkState::GenericPageProcessed), 2);

    server.verify().await;
}

#[tokio::test]
async fn test_corrupt_seed_does_not_stop_the_run() {
    let server = MockServer::start().await;
    let base = server.uri();
    for name in ["/first.pdf", "/second.pdf"] {
        Mock::given(method("GET"))
            .and(path(name))
            .respond_with(pdf_response(pdf_linking_to(&[])))
            .mount(&server)
            .await;
    }

    let seeds = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_seed(seeds.path(), "a.pdf", &[format!("{}/first.pdf", base)]);
    std::fs::write(seeds.path().join("b.pdf"), b"not a pdf at all").unwrap();
    write_seed(seeds.path(), "c.pdf", &[format!("{}/second.pdf", base)]);

    let summary = harvest(test_config(out.path()), seeds.path(), false)
        .await
        .unwrap();

    assert_eq!(summary.seeds_processed(), 3);
    let broken = &summary.seeds[1];
    assert!(broken.error.is_some());
    assert_eq!(broken.counts.links_found, 0);
    assert_eq!(broken.counts.attempted, 0);

    let totals = summary.totals();
    assert_eq!(totals.attempted, 2);
    assert_eq!(totals.succeeded, 2);
    assert!(out.path().join("first.pdf").exists());
    assert!(out.path().join("second.pdf").exists());
}

#[tokio::test]
async fn test_missing_input_is_fatal() {
    let out = tempfile::tempdir().unwrap();
    let result = harvest(
        test_config(out.path()),
        &out.path().join("missing"),
        false,
    )
    .await;
    assert!(matches!(
        result,
        Err(pdf_harvest::HarvestError::InputNotFound(_))
    ));
}

#[tokio::test]
async fn test_group_by_input() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w1.pdf"))
        .respond_with(pdf_response(pdf_linking_to(&[])))
        .mount(&server)
        .await;

    let seeds = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_seed(seeds.path(), "week1.pdf", &[format!("{}/w1.pdf", server.uri())]);

    let mut config = test_config(out.path());
    config.output.group_by_input = true;
    let summary = harvest(config, seeds.path(), false).await.unwrap();

    assert_eq!(summary.seeds[0].out_dir, out.path().join("week1"));
    assert!(out.path().join("week1").join("w1.pdf").exists());
}
