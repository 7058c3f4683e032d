//! Content-type tags and their MIME strings.

/// Content-type tag attached to a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Html,
    Javascript,
    Css,
    Csv,
    Json,
    Xml,
    Bin,
    Pdf,
    Jpeg,
    Png,
    Svg,
    Webp,
    Ico,
    Mp3,
    Wav,
    Weba,
    Mp4,
    Mpeg,
    Webm,
}

/// Category a content type belongs to.
///
/// Used only to decide whether a `Content-Length` header is auto-populated:
/// Text always gets one, Application only for JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTypeCategory {
    Text,
    Application,
    Image,
    Audio,
    Video,
}

impl ContentType {
    /// MIME string for the `Content-Type` header.
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Text => "text/plain",
            ContentType::Html => "text/html",
            ContentType::Javascript => "text/javascript",
            ContentType::Css => "text/css",
            ContentType::Csv => "text/csv",
            ContentType::Json => "application/json",
            ContentType::Xml => "application/xml",
            ContentType::Bin => "application/octet-stream",
            ContentType::Pdf => "application/pdf",
            ContentType::Jpeg => "image/jpeg",
            ContentType::Png => "image/png",
            ContentType::Svg => "image/svg+xml",
            ContentType::Webp => "image/webp",
            ContentType::Ico => "image/vnd.microsoft.icon",
            ContentType::Mp3 => "audio/mpeg",
            ContentType::Wav => "audio/wav",
            ContentType::Weba => "audio/webm",
            ContentType::Mp4 => "video/mp4",
            ContentType::Mpeg => "video/mpeg",
            ContentType::Webm => "video/webm",
        }
    }

    pub fn category(&self) -> ContentTypeCategory {
        match self {
            ContentType::Text
            | ContentType::Html
            | ContentType::Javascript
            | ContentType::Css
            | ContentType::Csv => ContentTypeCategory::Text,
            ContentType::Json | ContentType::Xml | ContentType::Bin | ContentType::Pdf => {
                ContentTypeCategory::Application
            }
            ContentType::Jpeg
            | ContentType::Png
            | ContentType::Svg
            | ContentType::Webp
            | ContentType::Ico => ContentTypeCategory::Image,
            ContentType::Mp3 | ContentType::Wav | ContentType::Weba => ContentTypeCategory::Audio,
            ContentType::Mp4 | ContentType::Mpeg | ContentType::Webm => ContentTypeCategory::Video,
        }
    }
}
