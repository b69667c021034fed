//! Static file lookup across two roots (primary first, then secondary).

use std::path::{Component, Path, PathBuf};

use axum::body::Bytes;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::debug;

pub const INDEX_DOCUMENT: &str = "index.html";
pub const FAVICON_ASSET: &str = "logo_mark_gradient_sized.png";

#[derive(Debug, Clone)]
pub struct Asset {
    pub bytes: Bytes,
    pub content_type: String,
}

impl IntoResponse for Asset {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(header::CONTENT_TYPE, self.content_type)], self.bytes).into_response()
    }
}

#[derive(Debug, Clone)]
pub struct StaticRoots {
    roots: Vec<PathBuf>,
}

/// Percent-decode a request path exactly once. `None` when the result is not UTF-8.
/// Callers gate and resolve on this same decoded form.
pub fn decode_request_path(raw: &str) -> Option<String> {
    urlencoding::decode(raw).ok().map(|p| p.into_owned())
}

/// Turn an already-decoded request path into a safe relative path. Returns `None`
/// for anything that would climb out of a root, and for the empty path.
pub fn sanitize_relative(path: &str) -> Option<PathBuf> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let mut out = PathBuf::new();
    for comp in Path::new(trimmed).components() {
        match comp {
            Component::Normal(seg) => out.push(seg),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() { None } else { Some(out) }
}

impl StaticRoots {
    pub fn new(primary: impl Into<PathBuf>, secondary: impl Into<PathBuf>) -> Self {
        Self { roots: vec![primary.into(), secondary.into()] }
    }

    pub fn roots(&self) -> &[PathBuf] { &self.roots }

    /// First regular file matching the decoded `path` across the roots, in order.
    /// Read failures fall through to the next root.
    pub async fn load(&self, path: &str) -> Option<Asset> {
        let rel = sanitize_relative(path)?;
        for root in &self.roots {
            let candidate = root.join(&rel);
            match tokio::fs::metadata(&candidate).await {
                Ok(md) if md.is_file() => {}
                _ => continue,
            }
            match tokio::fs::read(&candidate).await {
                Ok(bytes) => {
                    let content_type = mime_guess::from_path(&candidate).first_or_octet_stream().to_string();
                    return Some(Asset { bytes: Bytes::from(bytes), content_type });
                }
                Err(e) => debug!(path = %candidate.display(), "asset read failed: {e}"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sanitize_rejects_traversal() {
        assert_eq!(sanitize_relative("/../etc/passwd"), None);
        assert_eq!(sanitize_relative("/a/../b"), None);
        assert_eq!(sanitize_relative("/"), None);
        assert_eq!(sanitize_relative(""), None);
        assert_eq!(sanitize_relative("/css/./site.css"), Some(PathBuf::from("css/site.css")));
        assert_eq!(sanitize_relative("/my cam.html"), Some(PathBuf::from("my cam.html")));
        // No second decoding pass: a literal `%6c` stays in the file name.
        assert_eq!(sanitize_relative("/cctv.htm%6c"), Some(PathBuf::from("cctv.htm%6c")));
    }

    #[test]
    fn decode_runs_once() {
        assert_eq!(decode_request_path("/cctv.htm%6c").as_deref(), Some("/cctv.html"));
        assert_eq!(decode_request_path("/cctv%2Ehtml").as_deref(), Some("/cctv.html"));
        assert_eq!(decode_request_path("/cctv.htm%256c").as_deref(), Some("/cctv.htm%6c"));
        assert_eq!(decode_request_path("/a/%2e%2e/b").as_deref(), Some("/a/../b"));
        assert_eq!(decode_request_path("/%ff.html"), None);
    }

    #[tokio::test]
    async fn primary_root_wins() {
        let primary = tempdir().unwrap();
        let secondary = tempdir().unwrap();
        std::fs::write(primary.path().join("app.js"), "primary").unwrap();
        std::fs::write(secondary.path().join("app.js"), "secondary").unwrap();
        std::fs::write(secondary.path().join("only.css"), "body{}").unwrap();

        let roots = StaticRoots::new(primary.path(), secondary.path());
        let js = roots.load("/app.js").await.unwrap();
        assert_eq!(&js.bytes[..], b"primary");
        assert!(js.content_type.contains("javascript"));

        let css = roots.load("only.css").await.unwrap();
        assert_eq!(&css.bytes[..], b"body{}");
        assert_eq!(css.content_type, "text/css");
    }

    #[tokio::test]
    async fn directories_and_missing_files_are_not_found() {
        let primary = tempdir().unwrap();
        let secondary = tempdir().unwrap();
        std::fs::create_dir(primary.path().join("cams")).unwrap();
        let roots = StaticRoots::new(primary.path(), secondary.path());
        assert!(roots.load("/cams").await.is_none());
        assert!(roots.load("/nope.png").await.is_none());
    }

    #[tokio::test]
    async fn unknown_extension_is_octet_stream() {
        let primary = tempdir().unwrap();
        std::fs::write(primary.path().join("blob.zzunknown"), [0u8, 1, 2]).unwrap();
        let roots = StaticRoots::new(primary.path(), primary.path().join("missing"));
        let asset = roots.load("/blob.zzunknown").await.unwrap();
        assert_eq!(asset.content_type, "application/octet-stream");
    }
}
