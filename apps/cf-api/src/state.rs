use std::sync::Arc;

use cf_service::CourseSearchService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<CourseSearchService>,
}
impl AppState {
	pub fn new(config: cf_config::Config) -> color_eyre::Result<Self> {
		let service = CourseSearchService::new(config)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: CourseSearchService) -> Self {
		Self { service: Arc::new(service) }
	}
}
