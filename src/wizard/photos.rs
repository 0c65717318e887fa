//! Photo collector: bounded, append-only.

use super::event::MediaContent;
use super::session::FormSession;
use super::validate::{ValidationError, check_photo_capacity, validate_photo};

/// Maximum number of photos per ad.
pub const MAX_PHOTOS: usize = 5;

/// Append one image to the session.
///
/// Non-image content is rejected whatever the count; an image beyond
/// [`MAX_PHOTOS`] is rejected too. On rejection the photos are unchanged.
/// Returns the new count.
pub fn collect(session: &mut FormSession, content: &MediaContent) -> Result<usize, ValidationError> {
    let photo = validate_photo(content)?;
    check_photo_capacity(session.photos().len())?;
    session.push_photo(photo);
    Ok(session.photos().len())
}

/// `N шт` summary, or `None` when nothing was collected.
pub fn summary(session: &FormSession) -> Option<String> {
    match session.photos().len() {
        0 => None,
        n => Some(format!("{n} шт")),
    }
}
