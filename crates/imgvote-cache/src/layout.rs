//! Object naming in the blob store and on local disk

use std::collections::HashMap;

/// Suffix of description objects, appended to the image file name
const DESCRIPTION_SUFFIX: &str = ".txt";

/// Extension used when neither the file name nor the mime type gives one
const FALLBACK_EXTENSION: &str = ".bin";

/// Folder names of the two blob-store areas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLayout {
    pub original_folder: String,
    pub cached_folder: String,
}

impl Default for BlobLayout {
    fn default() -> Self {
        Self {
            original_folder: "20250901".to_string(),
            cached_folder: "20250901_cached".to_string(),
        }
    }
}

impl BlobLayout {
    pub fn new(original_folder: &str, cached_folder: &str) -> Self {
        Self {
            original_folder: original_folder.trim_matches('/').to_string(),
            cached_folder: cached_folder.trim_matches('/').to_string(),
        }
    }

    pub fn original_prefix(&self) -> String {
        format!("{}/", self.original_folder)
    }

    pub fn cached_prefix(&self) -> String {
        format!("{}/", self.cached_folder)
    }

    /// `{id}{ext}`: the file name shared by every tier
    pub fn file_name(id: &str, ext: &str) -> String {
        format!("{id}{ext}")
    }

    /// `{id}{ext}.txt`
    pub fn description_file_name(id: &str, ext: &str) -> String {
        format!("{id}{ext}{DESCRIPTION_SUFFIX}")
    }

    pub fn original_object(&self, id: &str, ext: &str) -> String {
        format!("{}/{}", self.original_folder, Self::file_name(id, ext))
    }

    pub fn cached_object(&self, id: &str, ext: &str) -> String {
        format!("{}/{}", self.cached_folder, Self::file_name(id, ext))
    }

    pub fn description_object(&self, id: &str, ext: &str) -> String {
        format!(
            "{}/{}",
            self.original_folder,
            Self::description_file_name(id, ext)
        )
    }

    /// Build the id → extension map from object names in the original folder.
    ///
    /// Names outside the folder, description files and names without an
    /// extension are skipped.
    pub fn parse_listing<I, S>(&self, names: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefix = self.original_prefix();
        names
            .into_iter()
            .filter_map(|name| {
                let file = name.as_ref().strip_prefix(&prefix)?;
                if file.ends_with(DESCRIPTION_SUFFIX) || file.contains('/') {
                    return None;
                }
                let (stem, ext) = file.rsplit_once('.')?;
                if stem.is_empty() || ext.is_empty() {
                    return None;
                }
                Some((stem.to_string(), format!(".{ext}")))
            })
            .collect()
    }
}

/// Content type reported for an image, derived from its extension
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "svg" | "svg+xml" => "image/svg+xml",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Extension for a new upload.
///
/// Taken from the file name (lower-cased); otherwise from an `image/*` mime
/// subtype with any `+suffix` dropped (`image/svg+xml` gives `.svg`), so the
/// stored extension maps back to the same content type; otherwise `.bin`.
pub fn upload_extension(file_name: &str, mime: Option<&str>) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    if let Some((stem, ext)) = base.rsplit_once('.') {
        if !stem.is_empty() && !ext.is_empty() {
            return format!(".{}", ext.to_ascii_lowercase());
        }
    }

    mime.and_then(|m| m.strip_prefix("image/"))
        .map(|subtype| subtype.split([';', '+']).next().unwrap_or(subtype).trim())
        .filter(|subtype| !subtype.is_empty())
        .map(|subtype| format!(".{}", subtype.to_ascii_lowercase()))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_names() {
        let layout = BlobLayout::default();
        assert_eq!(layout.original_object("abc", ".jpg"), "20250901/abc.jpg");
        assert_eq!(layout.cached_object("abc", ".jpg"), "20250901_cached/abc.jpg");
        assert_eq!(layout.description_object("abc", ".jpg"), "20250901/abc.jpg.txt");
        assert_eq!(BlobLayout::file_name("abc", ".jpg"), "abc.jpg");
        assert_eq!(BlobLayout::description_file_name("abc", ".jpg"), "abc.jpg.txt");
    }

    #[test]
    fn test_new_trims_slashes() {
        let layout = BlobLayout::new("/orig/", "cache/");
        assert_eq!(layout.original_prefix(), "orig/");
        assert_eq!(layout.cached_prefix(), "cache/");
    }

    #[test]
    fn test_parse_listing() {
        let layout = BlobLayout::default();
        let listing = layout.parse_listing([
            "20250901/aaa.jpg",
            "20250901/aaa.jpg.txt",
            "20250901/bbb.png",
            "20250901/noext",
            "20250901/.hidden",
            "20250901/nested/ccc.png",
            "20250901_cached/ddd.jpg",
            "other/eee.jpg",
        ]);

        assert_eq!(listing.len(), 2);
        assert_eq!(listing["aaa"], ".jpg");
        assert_eq!(listing["bbb"], ".png");
    }

    #[test]
    fn test_parse_listing_uses_last_dot() {
        let layout = BlobLayout::default();
        let listing = layout.parse_listing(["20250901/my.photo.jpeg"]);
        assert_eq!(listing["my.photo"], ".jpeg");
    }

    #[test]
    fn test_content_type_for_extension() {
        assert_eq!(content_type_for_extension(".jpg"), "image/jpeg");
        assert_eq!(content_type_for_extension(".JPEG"), "image/jpeg");
        assert_eq!(content_type_for_extension(".png"), "image/png");
        assert_eq!(content_type_for_extension(".webp"), "image/webp");
        assert_eq!(content_type_for_extension(".bin"), "application/octet-stream");
        assert_eq!(content_type_for_extension(""), "application/octet-stream");
    }

    #[test]
    fn test_upload_extension_from_file_name() {
        assert_eq!(upload_extension("Photo.JPG", Some("image/jpeg")), ".jpg");
        assert_eq!(upload_extension("C:\\Users\\me\\cat.PNG", None), ".png");
        assert_eq!(upload_extension("archive.tar.gz", None), ".gz");
    }

    #[test]
    fn test_upload_extension_from_mime() {
        assert_eq!(upload_extension("blob", Some("image/webp")), ".webp");
        assert_eq!(upload_extension("blob", Some("image/png; charset=binary")), ".png");
        assert_eq!(upload_extension(".profile", Some("image/gif")), ".gif");
        assert_eq!(upload_extension("blob", Some("image/PNG")), ".png");
    }

    #[test]
    fn test_mime_extension_maps_back_to_content_type() {
        let ext = upload_extension("blob", Some("image/svg+xml"));
        assert_eq!(ext, ".svg");
        assert_eq!(content_type_for_extension(&ext), "image/svg+xml");

        // Objects stored before suffixes were dropped
        assert_eq!(content_type_for_extension(".svg+xml"), "image/svg+xml");
    }

    #[test]
    fn test_upload_extension_fallback() {
        assert_eq!(upload_extension("blob", Some("application/pdf")), ".bin");
        assert_eq!(upload_extension("blob", None), ".bin");
        assert_eq!(upload_extension("blob", Some("image/")), ".bin");
    }
}
