//! Shared-drive link normalization.
//!
//! Admins paste Google Drive *sharing* links ("Anyone with the link") into
//! the image field. Those URLs point at a viewer page, not at image bytes, so
//! every render goes through [`normalize_drive_link`] to get a URL an `<img>`
//! tag can load.
//!
//! Recognized shapes:
//!
//! ```text
//! https://drive.google.com/file/d/{id}/view?usp=sharing
//! https://drive.google.com/open?id={id}
//! https://drive.google.com/uc?id={id}&export=download
//! ```

use url::Url;

/// Image shown when a product has no image or its image fails to load.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://images.unsplash.com/photo-1590247813693-5541d1c609fd?auto=format&fit=crop&q=80&w=800";

const DRIVE_HOST: &str = "drive.google.com";
const DIRECT_IMAGE_BASE: &str = "https://lh3.googleusercontent.com/d/";

/// Whether the raw link looks like a shared-drive link.
///
/// This is the loose substring check the product form uses to decide
/// whether to ask for confirmation; it does not validate the URL.
#[must_use]
pub fn is_drive_link(raw: &str) -> bool {
    raw.contains(DRIVE_HOST)
}

/// Convert a shared-drive link into a directly renderable image URL.
///
/// Total: anything that is not a recognizable drive link (including
/// malformed input) is returned unchanged, apart from trimming.
#[must_use]
pub fn normalize_drive_link(raw: &str) -> String {
    let raw = raw.trim();
    drive_file_id(raw).map_or_else(
        || raw.to_owned(),
        |id| format!("{DIRECT_IMAGE_BASE}{id}"),
    )
}

/// URL to render for a stored image value, falling back to the placeholder
/// when the value is blank.
#[must_use]
pub fn display_image(raw: &str) -> String {
    if raw.trim().is_empty() {
        PLACEHOLDER_IMAGE_URL.to_owned()
    } else {
        normalize_drive_link(raw)
    }
}

fn drive_file_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    if url.host_str()? != DRIVE_HOST {
        return None;
    }

    let mut segments = url.path_segments()?;
    let from_path = match (segments.next(), segments.next(), segments.next()) {
        (Some("file"), Some("d"), Some(id)) => Some(id.to_owned()),
        _ => None,
    };

    from_path
        .or_else(|| {
            url.query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, value)| value.into_owned())
        })
        .filter(|id| is_file_id(id))
}

fn is_file_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_file_view_link() {
        assert_eq!(
            normalize_drive_link(
                "https://drive.google.com/file/d/1AbC-d_EfG/view?usp=sharing"
            ),
            "https://lh3.googleusercontent.com/d/1AbC-d_EfG"
        );
    }

    #[test]
    fn test_normalize_open_and_uc_links() {
        assert_eq!(
            normalize_drive_link("https://drive.google.com/open?id=XYZ123"),
            "https://lh3.googleusercontent.com/d/XYZ123"
        );
        assert_eq!(
            normalize_drive_link("https://drive.google.com/uc?export=download&id=XYZ123"),
            "https://lh3.googleusercontent.com/d/XYZ123"
        );
    }

    #[test]
    fn test_non_drive_links_pass_through() {
        let cdn = "https://cdn.example.com/lamp.jpg";
        assert_eq!(normalize_drive_link(cdn), cdn);
        assert_eq!(normalize_drive_link("  not a url  "), "not a url");
        assert_eq!(normalize_drive_link(""), "");
    }

    #[test]
    fn test_drive_link_without_id_passes_through() {
        let folder = "https://drive.google.com/drive/folders/";
        assert_eq!(normalize_drive_link(folder), folder);
        let bad_id = "https://drive.google.com/open?id=<script>";
        assert_eq!(normalize_drive_link(bad_id), bad_id);
    }

    #[test]
    fn test_is_drive_link_is_substring_check() {
        assert!(is_drive_link("https://drive.google.com/file/d/x/view"));
        assert!(is_drive_link("drive.google.com"));
        assert!(!is_drive_link("https://photos.google.com/x"));
        assert!(!is_drive_link(""));
    }

    #[test]
    fn test_display_image_falls_back_for_blank() {
        assert_eq!(display_image("   "), PLACEHOLDER_IMAGE_URL);
        assert_eq!(
            display_image("https://drive.google.com/open?id=A1"),
            "https://lh3.googleusercontent.com/d/A1"
        );
    }
}
