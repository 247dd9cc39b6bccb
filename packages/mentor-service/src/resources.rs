use mentor_storage::models::Resource;

use crate::{MentorService, ServiceError, ServiceResult};

impl MentorService {
	pub async fn resource(&self, resource_id: i64) -> ServiceResult<Resource> {
		self.store.fetch_resource(resource_id).await?.ok_or_else(|| {
			ServiceError::NotFound { message: format!("resource {resource_id}") }
		})
	}
}
