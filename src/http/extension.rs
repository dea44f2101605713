/// Static content-type to file extension table. Parameters such as `; charset=utf-8`
/// are ignored and matching is case-insensitive. Unmapped types yield `None`.
pub(super) fn guess_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let extension = match essence.as_str() {
        // archives
        "application/zip"
        | "application/x-zip-compressed"
        | "application/x-7z-compressed"
        | "application/x-rar-compressed"
        | "application/x-tar" => ".zip",
        "application/x-gzip" | "application/gzip" => ".gz",
        "application/java-archive" | "application/x-java-archive" => ".jar",

        "text/x-java-source" | "text/x-java" | "text/java" => ".java",

        // documents
        "application/pdf" => ".pdf",
        "application/msword" => ".doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => ".docx",
        "application/vnd.ms-excel" => ".xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => ".xlsx",
        "application/vnd.ms-powerpoint" => ".ppt",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => ".pptx",

        // images
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/bmp" => ".bmp",
        "image/webp" => ".webp",
        "image/svg+xml" => ".svg",

        // audio
        "audio/mpeg" => ".mp3",
        "audio/wav" => ".wav",
        "audio/ogg" => ".ogg",

        // video
        "video/mp4" => ".mp4",
        "video/x-msvideo" => ".avi",
        "video/x-matroska" => ".mkv",

        // text
        "text/plain" => ".txt",
        "text/html" => ".html",
        "text/css" => ".css",
        "application/javascript" | "text/javascript" => ".js",
        "application/json" => ".json",
        "application/xml" | "text/xml" => ".xml",

        "application/octet-stream" => ".bin",
        "application/vnd.android.package-archive" => ".apk",
        "application/x-sh" => ".sh",

        _ => return None,
    };
    Some(extension)
}
