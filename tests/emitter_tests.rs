/// Emitter against a mock gateway
use perflog_gateway::{
    emitter::{emit, Outcome},
    validator::validate,
};
use std::time::Duration;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

#[tokio::test]
async fn test_emit_posts_valid_lines() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(201))
        .expect(5)
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let mut seen = Vec::new();
    let report = emit(
        &client,
        &format!("{}/", server.uri()),
        5,
        Duration::from_secs(5),
        |i, outcome| seen.push((i, outcome.clone())),
    )
    .await;

    assert_eq!(report.accepted, 5);
    assert_eq!(seen.first(), Some(&(1, Outcome::Status(201))));
    assert_eq!(seen.last(), Some(&(5, Outcome::Status(201))));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 5);
    for request in requests {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let line = body["log"].as_str().unwrap();
        assert!(validate(line).is_ok(), "{}", line);
    }
}

#[tokio::test]
async fn test_emit_counts_rejections_and_timeouts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let report = emit(&client, &server.uri(), 2, Duration::from_millis(50), |_, _| {}).await;

    assert_eq!(report.rejected, 1);
    assert_eq!(report.timed_out, 1);
    assert_eq!(report.accepted, 0);
}
