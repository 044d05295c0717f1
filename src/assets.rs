//! Local file access for served assets and the metrics page template.
//!
//! Files are read through a `cap_std` directory handle, so a request path can
//! never resolve outside the configured root.

use std::io;
use std::path::{Component, Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};

/// Placeholder in the metrics template replaced with the current hit count.
pub const HITS_PLACEHOLDER: &str = "{{hits}}";

/// Root directory of the files served under `/app`.
#[derive(Debug)]
pub struct AssetDir {
    dir: Dir,
}

/// A file read from an [`AssetDir`].
#[derive(Debug)]
pub struct Asset {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl AssetDir {
    pub fn open(root: &Path) -> io::Result<Self> {
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        Ok(Self { dir })
    }

    /// Read the file at the request `tail`, serving `index.html` for
    /// directories and the empty path.
    pub fn read(&self, tail: &str) -> io::Result<Asset> {
        let mut path = relative_path(tail)?;
        if path.as_os_str().is_empty() || self.dir.metadata(&path)?.is_dir() {
            path.push("index.html");
        }
        let bytes = self.dir.read(&path)?;
        Ok(Asset {
            content_type: content_type_for(&path),
            bytes,
        })
    }
}

/// Reject anything but plain relative components.
fn relative_path(tail: &str) -> io::Result<PathBuf> {
    let mut path = PathBuf::new();
    for component in Path::new(tail.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("refusing asset path {tail}"),
                ))
            }
        }
    }
    Ok(path)
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Read the metrics template at `path`.
pub fn read_template(path: &Path) -> io::Result<String> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "template path has no file name"))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.read_to_string(file_name)
}

pub fn render_metrics(template: &str, hits: u32) -> String {
    template.replace(HITS_PLACEHOLDER, &hits.to_string())
}
