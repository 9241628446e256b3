use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    Json, Router,
};
use paperchef_extract::{DocumentExtractor, GeminiExtractor};
use paperchef_models::{Config, DocumentSummary};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct FakeGemini {
    reply: Arc<(StatusCode, Value)>,
    seen: Arc<Mutex<Option<(Uri, HeaderMap, Value)>>>,
}

async fn generate(
    State(fake): State<FakeGemini>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    *fake.seen.lock().unwrap() = Some((uri, headers, body));
    let (status, reply) = &*fake.reply;
    (*status, Json(reply.clone()))
}

async fn extractor_against(status: StatusCode, reply: Value) -> (GeminiExtractor, FakeGemini) {
    let fake = FakeGemini {
        reply: Arc::new((status, reply)),
        seen: Arc::new(Mutex::new(None)),
    };
    let app = Router::new().fallback(generate).with_state(fake.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut config = Config::default().extraction;
    config.api_key = Some("test-key".to_string());
    config.base_url = format!("http://{addr}");
    (GeminiExtractor::new(&config).unwrap(), fake)
}

fn text_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn sends_pdf_inline_and_parses_fenced_reply() {
    let (extractor, fake) = extractor_against(
        StatusCode::OK,
        text_reply("```json\n{\"title\": \"Pasta Atlas\", \"author\": \"R. Rossi\", \"summary\": \"One. Two. Three.\"}\n```"),
    )
    .await;

    let summary = extractor.extract(b"%PDF-1.4 fake").await.unwrap();
    assert_eq!(summary.title, "Pasta Atlas");
    assert_eq!(summary.author, "R. Rossi");
    assert_eq!(summary.summary, "One. Two. Three.");

    let seen = fake.seen.lock().unwrap().clone().unwrap();
    let (uri, headers, body) = seen;
    assert_eq!(
        uri.path(),
        "/v1beta/models/gemini-2.5-flash:generateContent"
    );
    assert_eq!(headers["x-goog-api-key"], "test-key");
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["inline_data"]["mime_type"], "application/pdf");
    assert_eq!(parts[0]["inline_data"]["data"], "JVBERi0xLjQgZmFrZQ==");
    assert!(parts[1]["text"]
        .as_str()
        .unwrap()
        .contains("3-sentence summary"));
}

#[tokio::test]
async fn unparseable_reply_yields_fallback() {
    let (extractor, _fake) =
        extractor_against(StatusCode::OK, text_reply("I could not read that document.")).await;
    let summary = extractor.extract(b"%PDF").await.unwrap();
    assert_eq!(summary, DocumentSummary::unparseable());
}

#[tokio::test]
async fn upstream_failure_is_an_error() {
    let (extractor, _fake) = extractor_against(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"code": 429, "message": "quota exceeded"}}),
    )
    .await;
    let err = extractor.extract(b"%PDF").await.unwrap_err();
    assert_eq!(err.http_status(), 502);
    assert!(err.to_string().contains("quota exceeded"));
}
