//! Image Upload
//!
//! Account-backed listings reference their photo by storage path. A draft
//! that only has a device reference gets its image uploaded first.

use derive_more::Display;

use crate::domain::entity::ListingDraft;
use crate::domain::repository::{ImageReader, ListingBackend};
use crate::domain::value_object::Identity;
use crate::error::{ListingError, ListingResult};

/// Which half of the upload failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MediaStep {
    #[display("read_image")]
    ReadImage,
    #[display("upload_image")]
    UploadImage,
}

#[derive(Debug)]
pub struct MediaError {
    pub step: MediaStep,
    pub source: ListingError,
}

impl From<MediaError> for ListingError {
    fn from(err: MediaError) -> Self {
        err.source
    }
}

/// Make sure `draft` has a storage path, uploading its device image if not
pub async fn ensure_uploaded<B, R>(
    backend: &B,
    reader: &R,
    identity: &Identity,
    draft: &mut ListingDraft,
) -> Result<(), MediaError>
where
    B: ListingBackend,
    R: ImageReader,
{
    if draft
        .storage_path
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty())
    {
        return Ok(());
    }
    let uri = draft.image_uri.clone().unwrap_or_default();

    let image = reader.read(&uri).await.map_err(|source| MediaError {
        step: MediaStep::ReadImage,
        source,
    })?;
    if !image.is_image() {
        return Err(MediaError {
            step: MediaStep::ReadImage,
            source: ListingError::Image(format!("{uri} is not an image")),
        });
    }

    let mime_type = image.mime_type.clone();
    let path = backend
        .upload_image(identity, image.bytes, &mime_type)
        .await
        .map_err(|source| MediaError {
            step: MediaStep::UploadImage,
            source,
        })?;

    tracing::debug!(storage_path = %path, "Uploaded listing image");
    draft.storage_path = Some(path);
    Ok(())
}

/// [`ensure_uploaded`] for callers that only need a [`ListingResult`]
pub async fn upload_if_needed<B, R>(
    backend: &B,
    reader: &R,
    identity: &Identity,
    draft: &mut ListingDraft,
) -> ListingResult<()>
where
    B: ListingBackend,
    R: ImageReader,
{
    ensure_uploaded(backend, reader, identity, draft)
        .await
        .map_err(ListingError::from)
}
