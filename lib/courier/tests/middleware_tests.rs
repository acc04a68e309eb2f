//! Integration tests for `HyperClient` middleware.

use courier::{
    HttpClient, HyperClient, Method, Request, Response, fetch, header::HeaderValue,
    middleware::LoggingLayer,
};
use tower::util::{MapRequestLayer, MapResponseLayer};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn get(url: String) -> Request {
    Request::builder(Method::Get, url).build().expect("request")
}

/// Logging must not change the request or the response.
#[tokio::test]
async fn test_logging_middleware() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logged"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"logged": true})))
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().with_logging().build();

    let response = client
        .execute(get(format!("{}/logged", mock_server.uri())))
        .await
        .expect("response");

    assert!(response.is_success());
    let body: serde_json::Value = response.json().expect("json");
    assert_eq!(body, serde_json::json!({"logged": true}));
}

#[tokio::test]
async fn test_debug_logging_with_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().with_debug_logging().build();

    let response = client
        .execute(get(mock_server.uri()))
        .await
        .expect("response");

    assert_eq!(response.status(), 404);
}

/// Layers see the request after options have been applied.
#[tokio::test]
async fn test_request_layer_with_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/protected"))
        .and(header("Authorization", "Bearer my-secret-token"))
        .and(header("X-Request-Source", "fetch"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder()
        .layer(MapRequestLayer::new(|mut request: Request| {
            request.headers_mut().insert(
                "Authorization",
                HeaderValue::from_static("Bearer my-secret-token"),
            );
            request
        }))
        .with(LoggingLayer::new())
        .build();

    let () = fetch(Method::Get, format!("{}/protected", mock_server.uri()))
        .header("X-Request-Source", "fetch")
        .client(client)
        .send()
        .await
        .expect("no content");
}

/// Response layers run before the handlers see the response.
#[tokio::test]
async fn test_response_layer_with_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"["a","b"]"#, "text/plain"))
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder()
        .layer(MapResponseLayer::new(|response: Response| {
            let (status, mut headers, body) = response.into_parts();
            headers.insert(
                courier::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            Response::new(status, headers, body)
        }))
        .build();

    let letters: Vec<String> = fetch(Method::Get, mock_server.uri())
        .client(client)
        .send()
        .await
        .expect("letters");

    assert_eq!(letters, vec!["a", "b"]);
}
