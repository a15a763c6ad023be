//! End-to-end crawl against a mock portal.

use std::sync::Arc;

use datagov::models::Theme;
use datagov::scrapers::{HttpClient, ListingState, PageFetcher, PortalConfig, PortalCrawler};
use datagov::storage::DatasetWriter;
use mockito::{Matcher, Mock, Server, ServerGuard};
use tempfile::tempdir;

const THEME_INDEX: &str = r#"
<html><body>
  <ul class="media-grid">
    <li class="media-item">
      <h2 class="media-heading">Agriculture</h2>
      <a class="media-view" href="/data/fr/group/agriculture">Voir</a>
    </li>
    <li class="media-item">
      <h2 class="media-heading">Santé</h2>
      <a class="media-view" href="/data/fr/group/sante">Voir</a>
    </li>
  </ul>
</body></html>
"#;

fn listing(stubs: &[&str]) -> String {
    let items: String = stubs
        .iter()
        .map(|stub| {
            format!(
                r#"<li class="dataset-item">
                     <h3 class="dataset-heading"><a href="{0}">{0}</a></h3>
                     <ul class="dataset-resources"><li><a href="{0}">XLSX</a></li></ul>
                   </li>"#,
                stub
            )
        })
        .collect();
    format!(r#"<ul class="dataset-list">{}</ul>"#, items)
}

async fn page(server: &mut ServerGuard, path: &str, body: String) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(body)
        .create_async()
        .await
}

async fn listing_page(server: &mut ServerGuard, path: &str, n: &str, body: String) -> Mock {
    server
        .mock("GET", path)
        .match_query(Matcher::UrlEncoded("page".into(), n.into()))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await
}

/// Stub page, detail page and file for one dataset.
async fn dataset(server: &mut ServerGuard, name: &str, tags: &[&str], file: &[u8]) -> Vec<Mock> {
    let tag_items: String = tags.iter().map(|t| format!("<li><a>{}</a></li>", t)).collect();
    vec![
        page(
            server,
            &format!("/stub/{}", name),
            format!(
                r#"<ul class="resource-list"><li class="resource-item"><a href="/data/fr/dataset/{}/resource/7f3a">R</a></li></ul>"#,
                name
            ),
        )
        .await,
        page(
            server,
            &format!("/data/fr/dataset/{}", name),
            format!(
                r#"<ul class="tag-list well">{}</ul>
                   <a class="btn resource-url-analytics" href="/files/{}.xlsx">Télécharger</a>"#,
                tag_items, name
            ),
        )
        .await,
        server
            .mock("GET", format!("/files/{}.xlsx", name).as_str())
            .with_status(200)
            .with_body(file)
            .expect(1)
            .create_async()
            .await,
    ]
}

fn portal(server: &ServerGuard) -> PortalConfig {
    PortalConfig {
        base_url: server.url(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_full_crawl_downloads_into_theme_directories() {
    let mut server = Server::new_async().await;
    let _index = page(&mut server, "/data/fr/group", THEME_INDEX.to_string()).await;

    let _agri_1 = listing_page(
        &mut server,
        "/data/fr/group/agriculture",
        "1",
        listing(&["/stub/cheptel-2010-2021", "/stub/broken", "/stub/peche"]),
    )
    .await;
    let _agri_2 = listing_page(
        &mut server,
        "/data/fr/group/agriculture",
        "2",
        listing(&["/stub/olives"]),
    )
    .await;
    let _agri_3 = listing_page(&mut server, "/data/fr/group/agriculture", "3", listing(&[])).await;
    let _sante_1 = server
        .mock("GET", "/data/fr/group/sante")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(503)
        .create_async()
        .await;

    let cheptel = dataset(
        &mut server,
        "cheptel-2010-2021",
        &["Elevage", "Ovins"],
        b"cheptel-v1",
    )
    .await;
    let peche = dataset(&mut server, "peche", &["Peche"], b"peche-v1").await;
    let olives = dataset(&mut server, "olives", &[], b"olives-v1").await;
    // A stub whose detail page has no download link is skipped on its own.
    let _broken_stub = page(
        &mut server,
        "/stub/broken",
        r#"<li class="resource-item"><a href="/data/fr/dataset/broken/resource/1">R</a></li>"#.to_string(),
    )
    .await;
    let _broken_detail = page(
        &mut server,
        "/data/fr/dataset/broken",
        r#"<ul class="tag-list"><li>x</li></ul>"#.to_string(),
    )
    .await;

    let dir = tempdir().unwrap();
    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpClient::new().unwrap());
    let crawler = PortalCrawler::new(portal(&server), fetcher.clone()).unwrap();
    let writer = DatasetWriter::new(fetcher, crawler.base_url().clone(), dir.path());
    let crawler = crawler.with_sink(Arc::new(writer));

    let summary = crawler.run(&[]).await.unwrap();

    assert_eq!(summary.themes.len(), 2);
    let agriculture: &Theme = &summary.themes[0];
    let names: Vec<_> = agriculture.datasets().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["cheptel-2010-2021", "peche", "olives"]);
    assert_eq!(
        agriculture.datasets()[0].tags.iter().cloned().collect::<Vec<_>>(),
        vec!["Elevage".to_string(), "Ovins".to_string()]
    );
    assert!(agriculture.datasets()[2].tags.is_empty());
    assert_eq!(
        agriculture.datasets()[0].canonical_url,
        format!("{}/data/fr/dataset/cheptel-2010-2021", server.url())
    );

    let agri_report = &summary.reports[0];
    assert_eq!(agri_report.pages, vec![1, 2]);
    assert_eq!(agri_report.state, ListingState::Done);
    assert_eq!(agri_report.skipped, 1);
    assert_eq!(agri_report.persisted, 3);

    let sante_report = &summary.reports[1];
    assert_eq!(sante_report.state, ListingState::Aborted);
    assert_eq!(summary.themes[1].dataset_count(), 0);

    let agri_dir = dir.path().join("Agriculture");
    assert_eq!(
        std::fs::read(agri_dir.join("cheptel-2010-2021.xlsx")).unwrap(),
        b"cheptel-v1"
    );
    assert_eq!(std::fs::read(agri_dir.join("peche.xlsx")).unwrap(), b"peche-v1");
    assert_eq!(std::fs::read(agri_dir.join("olives.xlsx")).unwrap(), b"olives-v1");
    assert!(!dir.path().join("Santé").exists());

    for mock in cheptel.iter().chain(&peche).chain(&olives) {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_metadata_only_crawl_of_one_theme() {
    let mut server = Server::new_async().await;
    let _index = page(&mut server, "/data/fr/group", THEME_INDEX.to_string()).await;
    let _agri_1 = listing_page(
        &mut server,
        "/data/fr/group/agriculture",
        "1",
        listing(&["/stub/peche"]),
    )
    .await;
    let _agri_2 = listing_page(&mut server, "/data/fr/group/agriculture", "2", listing(&[])).await;
    let sante = server
        .mock("GET", "/data/fr/group/sante")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let _stub = page(
        &mut server,
        "/stub/peche",
        r#"<li class="resource-item"><a href="/data/fr/dataset/peche/resource/1">R</a></li>"#.to_string(),
    )
    .await;
    let _detail = page(
        &mut server,
        "/data/fr/dataset/peche",
        r#"<a class="resource-url-analytics" href="/files/peche.csv">D</a>"#.to_string(),
    )
    .await;
    let file = server
        .mock("GET", "/files/peche.csv")
        .expect(0)
        .create_async()
        .await;

    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpClient::new().unwrap());
    let crawler = PortalCrawler::new(portal(&server), fetcher).unwrap();

    let summary = crawler.run(&["agriculture".to_string()]).await.unwrap();

    assert_eq!(summary.themes.len(), 1);
    assert_eq!(summary.dataset_count(), 1);
    assert_eq!(summary.themes[0].datasets()[0].download_link, "/files/peche.csv");
    assert_eq!(summary.reports[0].persisted, 0);
    sante.assert_async().await;
    file.assert_async().await;
}

#[tokio::test]
async fn test_max_pages_stops_listing() {
    let mut server = Server::new_async().await;
    let _index = page(&mut server, "/data/fr/group", THEME_INDEX.to_string()).await;
    let _agri_1 = listing_page(
        &mut server,
        "/data/fr/group/agriculture",
        "1",
        listing(&["/stub/peche"]),
    )
    .await;
    let agri_2 = server
        .mock("GET", "/data/fr/group/agriculture")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .expect(0)
        .create_async()
        .await;
    let _stub = page(
        &mut server,
        "/stub/peche",
        r#"<li class="resource-item"><a href="/data/fr/dataset/peche/resource/1">R</a></li>"#.to_string(),
    )
    .await;
    let _detail = page(
        &mut server,
        "/data/fr/dataset/peche",
        r#"<a class="resource-url-analytics" href="/files/peche.csv">D</a>"#.to_string(),
    )
    .await;

    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpClient::new().unwrap());
    let config = portal(&server).with_max_pages(Some(1));
    let crawler = PortalCrawler::new(config, fetcher).unwrap();

    let summary = crawler.run(&["Agriculture".to_string()]).await.unwrap();

    assert_eq!(summary.reports[0].pages, vec![1]);
    assert_eq!(summary.reports[0].state, ListingState::Done);
    agri_2.assert_async().await;
}
