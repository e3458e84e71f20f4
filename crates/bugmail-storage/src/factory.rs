use crate::{CloudinaryHost, HostError, HostResult, MediaHost};
use bugmail_core::Config;
use std::sync::Arc;

/// Create the media host based on configuration
pub fn create_media_host(config: &Config) -> HostResult<Arc<dyn MediaHost>> {
    let media = config.media_host();
    if media.cloud_name.is_empty() || media.api_key.is_empty() || media.api_secret.is_empty() {
        return Err(HostError::Config(
            "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set"
                .to_string(),
        ));
    }

    let host = CloudinaryHost::new(media.clone())?;
    Ok(Arc::new(host))
}
