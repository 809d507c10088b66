use super::{paths, types::PropertyPage};
use crate::{
    client::Client,
    error::Result,
    gateway::{ApiRequest, Operation},
};
use tracing::instrument;

impl Client {
    /// First page of active listings.
    ///
    /// # Errors
    /// Returns an error if the request fails or the listing is malformed.
    #[instrument(skip_all)]
    pub async fn properties(&self) -> Result<PropertyPage> {
        let request = ApiRequest::get(Operation::Resource, paths::PROPERTIES);
        let response = self.gateway().submit(request).await?.error_for_status()?;

        response.json()
    }
}
