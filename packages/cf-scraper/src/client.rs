use std::time::Duration;

use reqwest::{
	Client, StatusCode,
	header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::Deserialize;

use crate::{Error, Result, record::CourseListing};

#[derive(Debug, Deserialize)]
struct CoursePage {
	#[serde(default)]
	result: Option<Vec<CourseListing>>,
}

/// Outcome of fetching a single results page.
#[derive(Debug)]
pub enum PageOutcome {
	Courses(Vec<CourseListing>),
	/// The page parsed but carried no courses. Pagination ends here.
	Exhausted,
	/// The upstream answered with anything but `200 OK`. Pagination ends here.
	Rejected(StatusCode),
}

/// Every page fetched for one institute, plus the error that cut the walk short, if any.
#[derive(Debug, Default)]
pub struct FetchedCourses {
	pub courses: Vec<CourseListing>,
	pub error: Option<Error>,
}

pub struct CourseFinderClient {
	http: Client,
	base_url: String,
	page_delay: Duration,
}
impl CourseFinderClient {
	pub fn new(cfg: &cf_config::Scraper) -> Result<Self> {
		let mut headers = HeaderMap::new();

		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		let http = Client::builder()
			.user_agent(cfg.user_agent.as_str())
			.default_headers(headers)
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.build()?;

		Ok(Self {
			http,
			base_url: cfg.base_url.clone(),
			page_delay: Duration::from_millis(cfg.page_delay_ms),
		})
	}

	pub async fn fetch_page(&self, slug: &str, page: u32) -> Result<PageOutcome> {
		let page_param = page.to_string();
		let res = self
			.http
			.get(&self.base_url)
			.query(&[("institute", slug), ("page", page_param.as_str())])
			.send()
			.await?;
		let status = res.status();

		if status != StatusCode::OK {
			return Ok(PageOutcome::Rejected(status));
		}

		let body: CoursePage = res.json().await?;

		match body.result {
			Some(courses) if !courses.is_empty() => Ok(PageOutcome::Courses(courses)),
			_ => Ok(PageOutcome::Exhausted),
		}
	}

	/// Walks pages 1, 2, ... for one institute until the upstream runs out of courses or refuses
	/// a page. A transport or decoding error also ends the walk; the pages fetched before it
	/// are kept and the error is returned beside them.
	pub async fn fetch_courses(&self, slug: &str) -> FetchedCourses {
		let mut fetched = FetchedCourses::default();
		let mut page = 1_u32;

		loop {
			match self.fetch_page(slug, page).await {
				Ok(PageOutcome::Courses(batch)) => {
					tracing::info!(slug, page, count = batch.len(), "Fetched course page.");

					fetched.courses.extend(batch);
				},
				Ok(PageOutcome::Exhausted) => {
					tracing::info!(slug, page, "No more courses.");

					break;
				},
				Ok(PageOutcome::Rejected(status)) => {
					tracing::warn!(slug, page, %status, "Course page request was rejected.");

					break;
				},
				Err(err) => {
					fetched.error = Some(err);

					break;
				},
			}

			page += 1;

			if !self.page_delay.is_zero() {
				tokio::time::sleep(self.page_delay).await;
			}
		}

		fetched
	}
}
