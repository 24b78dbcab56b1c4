use std::{
	future::IntoFuture,
	sync::{Arc, Mutex},
};

use axum::{
	Json, Router,
	extract::State,
	http::{HeaderMap, StatusCode},
	response::IntoResponse,
	routing,
};
use serde_json::Value;
use tokio::{
	net::TcpListener,
	sync::{oneshot, oneshot::Sender},
};

use cf_domain::{answers::Answers, filter::FilterExpression};
use cf_storage::{Error, IndexQuery, pinecone::PineconeIndex};

#[derive(Clone)]
struct FakeIndex {
	requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
	status: StatusCode,
	response: Value,
}
impl FakeIndex {
	fn new(status: StatusCode, response: Value) -> Self {
		Self { requests: Arc::new(Mutex::new(Vec::new())), status, response }
	}

	fn requests(&self) -> Vec<(Option<String>, Value)> {
		self.requests.lock().expect("Request lock poisoned.").clone()
	}
}

async fn query_handler(
	State(fake): State<FakeIndex>,
	headers: HeaderMap,
	Json(payload): Json<Value>,
) -> impl IntoResponse {
	let api_key = headers.get("api-key").and_then(|value| value.to_str().ok()).map(str::to_string);

	fake.requests.lock().expect("Request lock poisoned.").push((api_key, payload));

	(fake.status, Json(fake.response.clone()))
}

async fn start_index_server(fake: FakeIndex) -> (String, Sender<()>) {
	let app = Router::new().route("/query", routing::post(query_handler)).with_state(fake);
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind index server.");
	let addr = listener.local_addr().expect("Failed to read index server address.");
	let (tx, rx) = oneshot::channel();
	let server = axum::serve(listener, app).with_graceful_shutdown(async move {
		let _ = rx.await;
	});

	tokio::spawn(async move {
		let _ = server.into_future().await;
	});

	(format!("http://{addr}"), tx)
}

fn index_config(url: String, namespace: Option<&str>) -> cf_config::VectorIndex {
	cf_config::VectorIndex {
		backend: "pinecone".to_string(),
		url,
		api_key: "pc-secret".to_string(),
		collection: "courses-data".to_string(),
		namespace: namespace.map(str::to_string),
		vector_name: None,
		timeout_ms: 2_000,
	}
}

fn three_hits() -> Value {
	serde_json::json!({
		"matches": [
			{ "id": "c-1", "score": 0.91, "metadata": { "course_title": "MSc Data Science", "course_fee": 14500.0 } },
			{ "id": "c-2", "score": 0.84, "metadata": { "course_title": "MSc AI" } },
			{ "id": "c-3", "score": 0.77 }
		],
		"namespace": ""
	})
}

#[tokio::test]
async fn sends_filter_and_parses_matches() {
	let fake = FakeIndex::new(StatusCode::OK, three_hits());
	let (url, shutdown) = start_index_server(fake.clone()).await;
	let index = PineconeIndex::new(&index_config(url, Some("uk"))).expect("Failed to build index.");
	let answers: Answers = serde_json::from_value(serde_json::json!({
		"country": "UK",
		"budget": "15000",
	}))
	.expect("Answers must deserialize.");
	let filter = FilterExpression::from_answers(&answers);
	let hits = index
		.query(&IndexQuery {
			vector: &[0.1, 0.2, 0.3],
			top_k: 40,
			filter: Some(&filter),
			include_metadata: true,
		})
		.await
		.expect("Query failed.");

	let _ = shutdown.send(());

	assert_eq!(hits.len(), 3);
	assert_eq!(hits[0].id, "c-1");
	assert_eq!(hits[0].metadata["course_title"], "MSc Data Science");
	assert!(hits[2].metadata.is_empty(), "Missing metadata must become an empty record.");

	let requests = fake.requests();
	let (api_key, body) = &requests[0];

	assert_eq!(api_key.as_deref(), Some("pc-secret"));
	assert_eq!(body["topK"], 40);
	assert_eq!(body["includeMetadata"], true);
	assert_eq!(body["includeValues"], false);
	assert_eq!(body["namespace"], "uk");
	assert_eq!(
		body["filter"],
		serde_json::json!({
			"country": { "$eq": "UK" },
			"course_fee": { "$lt": 15000.0 },
		})
	);
}

#[tokio::test]
async fn omits_filter_when_absent_or_empty() {
	let fake = FakeIndex::new(StatusCode::OK, serde_json::json!({ "matches": [] }));
	let (url, shutdown) = start_index_server(fake.clone()).await;
	let index = PineconeIndex::new(&index_config(url, None)).expect("Failed to build index.");
	let empty = FilterExpression::default();

	for filter in [None, Some(&empty)] {
		let hits = index
			.query(&IndexQuery { vector: &[0.5], top_k: 5, filter, include_metadata: true })
			.await
			.expect("Query failed.");

		assert!(hits.is_empty());
	}

	let _ = shutdown.send(());

	for (_, body) in fake.requests() {
		let body = body.as_object().expect("Body must be an object.");

		assert!(!body.contains_key("filter"), "Unexpected filter in {body:?}");
		assert!(!body.contains_key("namespace"), "Unexpected namespace in {body:?}");
	}
}

#[tokio::test]
async fn error_status_is_reported_with_body() {
	let fake = FakeIndex::new(
		StatusCode::BAD_REQUEST,
		serde_json::json!({ "code": 3, "message": "Invalid filter operator" }),
	);
	let (url, shutdown) = start_index_server(fake).await;
	let index = PineconeIndex::new(&index_config(url, None)).expect("Failed to build index.");
	let err = index
		.query(&IndexQuery { vector: &[0.5], top_k: 5, filter: None, include_metadata: true })
		.await
		.expect_err("Expected status error.");

	let _ = shutdown.send(());

	match err {
		Error::Status { status, body } => {
			assert_eq!(status.as_u16(), 400);
			assert!(body.contains("Invalid filter operator"), "Unexpected body: {body}");
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}
