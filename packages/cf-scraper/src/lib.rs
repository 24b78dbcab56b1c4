pub mod client;
pub mod export;
pub mod record;

mod error;

pub use client::{CourseFinderClient, FetchedCourses};
pub use error::{Error, Result};
pub use record::{CourseListing, CourseRecord};

use cf_config::ScrapeTarget;

#[derive(Debug, Default)]
pub struct ScrapeOutcome {
	pub records: Vec<CourseRecord>,
	/// Names of targets that yielded no courses or whose fetch errored. Courses fetched before
	/// an error are still in `records`.
	pub failed: Vec<String>,
}

/// Scrapes every target in order. A failing or empty target is logged and recorded, then
/// skipped.
pub async fn scrape(client: &CourseFinderClient, targets: &[ScrapeTarget]) -> ScrapeOutcome {
	let mut outcome = ScrapeOutcome::default();

	for target in targets {
		tracing::info!(name = %target.name, slug = %target.slug, "Scraping institute.");

		let fetched = client.fetch_courses(&target.slug).await;

		outcome.records.extend(
			fetched.courses.iter().map(|listing| CourseRecord::from_listing(&target.name, listing)),
		);

		if let Some(err) = fetched.error {
			tracing::error!(
				name = %target.name,
				kept = fetched.courses.len(),
				error = %err,
				"Failed to scrape institute."
			);

			outcome.failed.push(target.name.clone());
		} else if fetched.courses.is_empty() {
			tracing::warn!(name = %target.name, slug = %target.slug, "No courses found.");

			outcome.failed.push(target.name.clone());
		} else {
			tracing::info!(name = %target.name, courses = fetched.courses.len(), "Institute done.");
		}
	}

	outcome
}
