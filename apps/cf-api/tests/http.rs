use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
	response::Response,
};
use serde_json::{Map, Value};
use tower::util::ServiceExt;

use cf_api::{routes, state::AppState};
use cf_config::{
	Config, EmbeddingProviderConfig, Providers as ProviderConfigs, Search, Service, Storage,
	VectorIndex as IndexConfig,
};
use cf_service::{
	BoxFuture, CourseSearchService, EmbeddingProvider, Error, Providers, Result, VectorIndex,
};
use cf_storage::{IndexHit, IndexQuery};

#[derive(Default)]
struct CountingEmbedding {
	calls: AtomicUsize,
	fail: bool,
}
impl EmbeddingProvider for CountingEmbedding {
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let fail = self.fail;
		let count = texts.len();
		let has_empty = texts.iter().any(String::is_empty);

		Box::pin(async move {
			if fail {
				return Err(Error::Embedding { message: "401 Unauthorized".to_string() });
			}
			if has_empty {
				return Err(Error::Embedding { message: "400 empty input".to_string() });
			}

			Ok(vec![vec![0.1, 0.2, 0.3]; count])
		})
	}
}

/// Serves scripted results in order and remembers whether each query carried a filter.
struct ScriptedIndex {
	responses: Mutex<Vec<Result<Vec<IndexHit>>>>,
	filtered: Mutex<Vec<bool>>,
}
impl ScriptedIndex {
	fn new(mut responses: Vec<Result<Vec<IndexHit>>>) -> Self {
		responses.reverse();

		Self { responses: Mutex::new(responses), filtered: Mutex::new(Vec::new()) }
	}

	fn filtered(&self) -> Vec<bool> {
		self.filtered.lock().expect("Filter lock poisoned.").clone()
	}
}
impl VectorIndex for ScriptedIndex {
	fn query<'a>(&'a self, query: IndexQuery<'a>) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		self.filtered.lock().expect("Filter lock poisoned.").push(query.filter.is_some());

		let next = self.responses.lock().expect("Response lock poisoned.").pop();

		Box::pin(async move { next.unwrap_or_else(|| Ok(Vec::new())) })
	}
}

fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		providers: ProviderConfigs {
			embedding: EmbeddingProviderConfig {
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/embeddings".to_string(),
				model: "text-embedding-3-small".to_string(),
				dimensions: 3,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		storage: Storage {
			index: IndexConfig {
				backend: "pinecone".to_string(),
				url: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				collection: "courses-data".to_string(),
				namespace: None,
				vector_name: None,
				timeout_ms: 1_000,
			},
		},
		search: Search { default_top_k: 40, max_top_k: 100 },
	}
}

fn app(embedding: Arc<CountingEmbedding>, index: Arc<ScriptedIndex>) -> Router {
	let service =
		CourseSearchService::with_providers(test_config(), Providers::new(embedding, index));

	routes::router(AppState::from_service(service))
}

fn hit(id: &str, score: f32, metadata: Value) -> IndexHit {
	let Value::Object(metadata) = metadata else {
		panic!("Metadata must be a JSON object.");
	};

	IndexHit { id: id.to_string(), score, metadata }
}

async fn post_search(app: Router, body: String) -> Response {
	app.oneshot(
		Request::builder()
			.method("POST")
			.uri("/api/search")
			.header("content-type", "application/json")
			.body(Body::from(body))
			.expect("Failed to build request."),
	)
	.await
	.expect("Failed to call /api/search.")
}

async fn read_json(response: Response) -> Value {
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&body).expect("Failed to parse response.")
}

#[tokio::test]
async fn health_ok() {
	let app = app(Arc::default(), Arc::new(ScriptedIndex::new(Vec::new())));
	let response = app
		.oneshot(
			Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn search_returns_flattened_matches() {
	let embedding = Arc::new(CountingEmbedding::default());
	let index = Arc::new(ScriptedIndex::new(vec![Ok(vec![hit(
		"course-42",
		0.87,
		serde_json::json!({ "course_title": "MSc Data Science", "country": "UK", "course_fee": 14500 }),
	)])]));
	let payload = serde_json::json!({
		"query": "data science",
		"answers": { "country": "UK", "budget": "20000" },
		"top_k": 5,
	});
	let response = post_search(app(embedding.clone(), index.clone()), payload.to_string()).await;

	assert_eq!(response.status(), StatusCode::OK);

	let json = read_json(response).await;
	let first = &json["matches"][0];

	assert_eq!(json["matches"].as_array().map(Vec::len), Some(1));
	assert_eq!(first["id"], "course-42");
	assert_eq!(first["course_title"], "MSc Data Science");
	assert_eq!(first["course_fee"], 14500);
	assert!(first["score"].as_f64().is_some_and(|score| score > 0.8));
	assert_eq!(embedding.calls.load(Ordering::SeqCst), 1);
	assert_eq!(index.filtered(), [true]);
}

#[tokio::test]
async fn empty_filtered_search_falls_back_without_filter() {
	let index = Arc::new(ScriptedIndex::new(vec![
		Ok(Vec::new()),
		Ok(vec![
			hit("c-1", 0.9, serde_json::json!({ "course_title": "BSc Physics" })),
			hit("c-2", 0.8, serde_json::json!({ "course_title": "MPhys" })),
		]),
	]));
	let payload = serde_json::json!({
		"query": "physics",
		"answers": { "country": "Atlantis" },
	});
	let response = post_search(app(Arc::default(), index.clone()), payload.to_string()).await;

	assert_eq!(response.status(), StatusCode::OK);

	let json = read_json(response).await;
	let ids: Vec<_> = json["matches"]
		.as_array()
		.expect("matches must be an array.")
		.iter()
		.filter_map(|matched| matched["id"].as_str())
		.collect();

	assert_eq!(ids, ["c-1", "c-2"]);
	assert_eq!(index.filtered(), [true, false]);
}

#[tokio::test]
async fn out_of_range_top_k_is_rejected_before_any_call() {
	let embedding = Arc::new(CountingEmbedding::default());
	let index = Arc::new(ScriptedIndex::new(Vec::new()));
	let payload = serde_json::json!({ "query": "law", "answers": {}, "top_k": 0 });
	let response = post_search(app(embedding.clone(), index.clone()), payload.to_string()).await;

	assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

	let json = read_json(response).await;

	assert_eq!(json["error_code"], "INVALID_REQUEST");
	assert_eq!(embedding.calls.load(Ordering::SeqCst), 0);
	assert!(index.filtered().is_empty());
}

#[tokio::test]
async fn empty_query_is_a_server_error_from_the_provider() {
	let embedding = Arc::new(CountingEmbedding::default());
	let index = Arc::new(ScriptedIndex::new(Vec::new()));
	let payload = serde_json::json!({ "query": "", "answers": {} });
	let response = post_search(app(embedding.clone(), index.clone()), payload.to_string()).await;

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(read_json(response).await["error_code"], "EMBEDDING_FAILED");
	assert_eq!(embedding.calls.load(Ordering::SeqCst), 1);
	assert!(index.filtered().is_empty());
}

#[tokio::test]
async fn structured_budget_still_searches() {
	let index = Arc::new(ScriptedIndex::new(vec![Ok(vec![hit(
		"c-5",
		0.7,
		serde_json::json!({ "course_title": "LLM Law", "country": "UK" }),
	)])]));
	let payload = serde_json::json!({
		"query": "machine learning",
		"answers": { "country": "UK", "budget": [15000] },
	});
	let response = post_search(app(Arc::default(), index.clone()), payload.to_string()).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(read_json(response).await["matches"][0]["id"], "c-5");
	assert_eq!(index.filtered(), [true]);
}

#[tokio::test]
async fn malformed_bodies_keep_the_rejection_status() {
	let index = Arc::new(ScriptedIndex::new(Vec::new()));
	let cases = [
		("{\"query\": ", StatusCode::BAD_REQUEST),
		("{\"answers\": {}}", StatusCode::UNPROCESSABLE_ENTITY),
		("{\"query\": \"law\", \"answers\": {}, \"top_k\": -1}", StatusCode::UNPROCESSABLE_ENTITY),
	];

	for (body, status) in cases {
		let response = post_search(app(Arc::default(), index.clone()), body.to_string()).await;

		assert_eq!(response.status(), status, "{body}");

		let json = read_json(response).await;

		assert_eq!(json["error_code"], "INVALID_BODY", "{body}");
	}

	assert!(index.filtered().is_empty());
}

#[tokio::test]
async fn missing_content_type_is_unsupported_media() {
	let app = app(Arc::default(), Arc::new(ScriptedIndex::new(Vec::new())));
	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/api/search")
				.body(Body::from("{\"query\": \"law\", \"answers\": {}}"))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /api/search.");

	assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn provider_failures_are_server_errors() {
	let failing = Arc::new(CountingEmbedding { calls: AtomicUsize::new(0), fail: true });
	let payload = serde_json::json!({ "query": "nursing", "answers": {} }).to_string();
	let response =
		post_search(app(failing, Arc::new(ScriptedIndex::new(Vec::new()))), payload.clone()).await;

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(read_json(response).await["error_code"], "EMBEDDING_FAILED");

	let broken = Arc::new(ScriptedIndex::new(vec![Err(Error::Query {
		message: "connection refused".to_string(),
	})]));
	let response = post_search(app(Arc::default(), broken.clone()), payload).await;

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(read_json(response).await["error_code"], "QUERY_FAILED");
	assert_eq!(broken.filtered().len(), 1);
}
