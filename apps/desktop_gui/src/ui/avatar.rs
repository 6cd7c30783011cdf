//! Avatar decoding off the UI thread.

/// Largest edge, in pixels, kept after decoding a profile picture.
pub const AVATAR_MAX_EDGE: u32 = 256;

/// Straight-alpha RGBA pixels ready for `egui::ColorImage::from_rgba_unmultiplied`.
#[derive(Debug, Clone)]
pub struct AvatarImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

pub fn decode_avatar(bytes: &[u8]) -> Result<AvatarImage, String> {
    let dynamic = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let resized = dynamic
        .thumbnail(AVATAR_MAX_EDGE, AVATAR_MAX_EDGE)
        .to_rgba8();
    let width = resized.width() as usize;
    let height = resized.height() as usize;
    Ok(AvatarImage {
        width,
        height,
        rgba: resized.into_raw(),
    })
}
