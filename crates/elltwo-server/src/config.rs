use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Component, Path, PathBuf};

use crate::error::DocumentError;

/// Remote store configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding the markdown documents
    pub root: PathBuf,
    pub ip: IpAddr,
    pub port: u16,
    /// Serve every document with the `readonly` load and ignore mutations
    pub readonly: bool,
    /// Where `export` writes its output
    pub export_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("testing"),
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8500,
            readonly: false,
            export_dir: PathBuf::from("temp/export"),
        }
    }
}

impl ServerConfig {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = ip;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }

    /// Resolve a request path under the document root.
    pub fn document_path(&self, relative: &str) -> Result<PathBuf, DocumentError> {
        let relative = Path::new(relative);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !plain || relative.as_os_str().is_empty() {
            return Err(DocumentError::Path {
                path: relative.display().to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}
