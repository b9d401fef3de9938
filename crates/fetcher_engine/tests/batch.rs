use std::time::Duration;

use fetcher_engine::{
    BatchError, BatchRunner, FetchRequest, FetchSettings, RequestError, RequestLimits,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn runner() -> BatchRunner {
    fetcher_logging::initialize_for_tests();
    BatchRunner::new(
        RequestLimits::default(),
        FetchSettings::default(),
        vec!["text".into(), "html".into(), "xml".into()],
    )
}

fn request(urls: Vec<String>) -> FetchRequest {
    FetchRequest {
        urls,
        timeout: None,
        concurrency: None,
        to_markdown: true,
    }
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            body.to_string(),
            "text/html; charset=utf-8",
        ))
        .mount(server)
        .await;
}

#[tokio::test]
async fn batch_preserves_input_order_despite_mixed_failures() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", "<html><body><p>alpha</p></body></html>").await;
    mount_page(&server, "/b", "<html><body><p>beta</p></body></html>").await;
    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let urls = vec![
        format!("{}/a", server.uri()),
        format!("{}/forbidden", server.uri()),
        format!("{}/b", server.uri()),
    ];
    let result = runner().run(&request(urls.clone())).await.unwrap();

    assert_eq!(result.total, 3);
    assert_eq!(result.results.len(), 3);
    for (i, outcome) in result.results.iter().enumerate() {
        assert_eq!(outcome.url, urls[i]);
    }

    assert!(result.results[0].ok);
    assert!(result.results[0].content.as_ref().unwrap().contains("alpha"));

    let forbidden = &result.results[1];
    assert!(!forbidden.ok);
    assert_eq!(forbidden.status_code, Some(403));
    assert_eq!(forbidden.content, None);
    assert!(forbidden.error.as_ref().unwrap().contains("403"));

    assert!(result.results[2].ok);
    assert!(result.results[2].content.as_ref().unwrap().contains("beta"));
}

#[tokio::test]
async fn one_stalled_url_does_not_delay_the_others() {
    let server = MockServer::start().await;
    mount_page(&server, "/fast", "<html><body><p>quick</p></body></html>").await;
    Mock::given(method("GET"))
        .and(path("/stall"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_raw("<html>late</html>", "text/html"),
        )
        .mount(&server)
        .await;

    let urls = vec![
        format!("{}/stall", server.uri()),
        format!("{}/fast", server.uri()),
    ];
    let mut req = request(urls);
    req.timeout = Some(1.0);
    req.concurrency = Some(2);

    let result = runner().run(&req).await.unwrap();

    let stalled = &result.results[0];
    assert!(!stalled.ok);
    assert!(stalled.error.as_ref().unwrap().contains("timeout"));

    let fast = &result.results[1];
    assert!(fast.ok);
    // The fast item finished on its own clock, not the stalled one's.
    assert!(fast.elapsed_ms < 1_000, "fast item took {}ms", fast.elapsed_ms);
    // The batch waited for the stalled item's own timeout, no longer.
    assert!(result.elapsed_ms < 4_000, "batch took {}ms", result.elapsed_ms);
}

#[tokio::test]
async fn plain_text_mode_returns_no_markdown_syntax() {
    let server = MockServer::start().await;
    let body = r#"<html><body><h1>Title</h1><p><a href="https://example.com">link</a></p></body></html>"#;
    mount_page(&server, "/a", body).await;
    mount_page(&server, "/b", body).await;

    let urls = vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())];
    let mut req = request(urls);
    req.to_markdown = false;

    let result = runner().run(&req).await.unwrap();
    for outcome in &result.results {
        let content = outcome.content.as_ref().unwrap();
        assert!(!content.contains('#'));
        assert!(!content.contains("]("));
    }
}

#[tokio::test]
async fn oversized_url_list_is_rejected_before_any_fetch() {
    let server = MockServer::start().await;
    // Zero expected requests: rejection happens at the boundary.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let urls: Vec<String> = (0..65).map(|i| format!("{}/page/{i}", server.uri())).collect();
    let err = runner().run(&request(urls)).await.unwrap_err();
    assert!(matches!(
        err,
        BatchError::Request(RequestError::TooManyUrls { max: 64 })
    ));
}

#[tokio::test]
async fn malformed_url_in_list_is_rejected_before_any_fetch() {
    let err = runner()
        .run(&request(vec!["https://ok.example".into(), "nope".into()]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BatchError::Request(RequestError::InvalidUrl { .. })
    ));
}

#[tokio::test]
async fn concurrency_bound_limits_parallelism() {
    let server = MockServer::start().await;
    for route in ["/p1", "/p2", "/p3", "/p4"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(200))
                    .set_body_raw("<html>p</html>", "text/html"),
            )
            .mount(&server)
            .await;
    }
    let urls: Vec<String> = ["/p1", "/p2", "/p3", "/p4"]
        .iter()
        .map(|r| format!("{}{}", server.uri(), r))
        .collect();

    let mut serial = request(urls.clone());
    serial.concurrency = Some(1);
    let serial_result = runner().run(&serial).await.unwrap();
    assert_eq!(serial_result.concurrency, 1);
    assert!(
        serial_result.elapsed_ms >= 800,
        "serial batch took {}ms",
        serial_result.elapsed_ms
    );

    let mut parallel = request(urls);
    parallel.concurrency = Some(4);
    let parallel_result = runner().run(&parallel).await.unwrap();
    assert_eq!(parallel_result.concurrency, 4);
    assert!(
        parallel_result.elapsed_ms < 700,
        "parallel batch took {}ms",
        parallel_result.elapsed_ms
    );
}

#[tokio::test]
async fn unsupported_content_type_keeps_status_but_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/image"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "image/png"))
        .mount(&server)
        .await;

    let result = runner()
        .run(&request(vec![format!("{}/image", server.uri())]))
        .await
        .unwrap();

    let outcome = &result.results[0];
    assert!(!outcome.ok);
    assert_eq!(outcome.status_code, Some(200));
    assert_eq!(outcome.content, None);
    assert!(outcome
        .error
        .as_ref()
        .unwrap()
        .contains("unsupported content type"));
}

#[tokio::test]
async fn non_2xx_outcome_records_declared_charset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/denied"))
        .respond_with(ResponseTemplate::new(403).set_body_raw(
            "<html>denied</html>",
            "text/html; charset=iso-8859-1",
        ))
        .mount(&server)
        .await;

    let result = runner()
        .run(&request(vec![format!("{}/denied", server.uri())]))
        .await
        .unwrap();

    let outcome = &result.results[0];
    assert!(!outcome.ok);
    assert_eq!(outcome.status_code, Some(403));
    // The body never reached decoding, so the header declaration stands.
    assert_eq!(outcome.charset.as_deref(), Some("windows-1252"));
    assert_eq!(outcome.content, None);
}

#[tokio::test]
async fn transport_failure_leaves_status_code_empty() {
    let result = runner()
        .run(&request(vec!["http://127.0.0.1:1/".into()]))
        .await
        .unwrap();

    let outcome = &result.results[0];
    assert!(!outcome.ok);
    assert_eq!(outcome.status_code, None);
    assert_eq!(outcome.content, None);
    assert!(outcome.error.is_some());
}

#[tokio::test]
async fn repeated_fetch_of_static_page_is_idempotent() {
    let server = MockServer::start().await;
    mount_page(&server, "/static", "<html><body><p>same</p></body></html>").await;
    let urls = vec![format!("{}/static", server.uri())];

    let first = runner().run(&request(urls.clone())).await.unwrap();
    let second = runner().run(&request(urls)).await.unwrap();

    let (a, b) = (&first.results[0], &second.results[0]);
    assert_eq!(a.url, b.url);
    assert_eq!(a.ok, b.ok);
    assert_eq!(a.status_code, b.status_code);
    assert_eq!(a.charset, b.charset);
    assert_eq!(a.content, b.content);
    assert_eq!(a.bytes_downloaded, b.bytes_downloaded);
}
