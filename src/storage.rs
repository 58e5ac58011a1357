//! Object storage for generated artifacts.
//!
//! Paths are derived from the record, not the content: regenerating a
//! document for the same record overwrites the previous object (latest
//! wins, no version history).

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::StorageConfig;
use crate::error::{Error, Result};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// `<category>/<record_id>_<person_name_with_underscores>.pdf`
pub fn artifact_path(category: &str, record_id: &str, person_name: &str) -> String {
    let name = person_name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{category}/{record_id}_{name}.pdf")
}

/// A bucket that accepts whole objects and serves them by public URL.
pub trait ObjectStore: Send + Sync {
    /// Create or overwrite the object at `path`. On error no object (and
    /// no partial object) is left at `path` by this call.
    fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// URL under which `path` is publicly retrievable.
    fn public_url(&self, path: &str) -> String;
}

/// Build the store described by `config`.
pub fn from_config(config: &StorageConfig) -> Result<Box<dyn ObjectStore>> {
    Ok(match config {
        StorageConfig::Memory { public_base_url } => {
            Box::new(MemoryStore::new(public_base_url.clone()))
        }
        StorageConfig::Local {
            root,
            public_base_url,
        } => Box::new(LocalStore::new(root.clone(), public_base_url.clone())),
        StorageConfig::Http {
            base_url,
            bucket,
            api_key,
        } => Box::new(HttpStore::new(base_url, bucket, api_key)?),
    })
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    public_base_url: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            objects: Mutex::new(HashMap::new()),
        }
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryStore {
    fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<()> {
        self.objects().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        join_url(&self.public_base_url, path)
    }
}

/// Directory-backed store. Writes land in a temp file in the target
/// directory and are renamed into place, so readers never observe a
/// partially written object.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path);
        let safe = rel
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
        if !safe || path.is_empty() {
            return Err(Error::Storage(format!("refusing object path {path:?}")));
        }
        Ok(self.root.join(rel))
    }
}

impl ObjectStore for LocalStore {
    fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<()> {
        let target = self.resolve(path)?;
        let dir = target
            .parent()
            .ok_or_else(|| Error::Storage(format!("no parent directory for {path:?}")))?;
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target)
            .map_err(|e| Error::Storage(format!("persist {}: {}", target.display(), e.error)))?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        join_url(&self.public_base_url, path)
    }
}

/// REST object storage (`/storage/v1/object/<bucket>/<path>` with upsert).
pub struct HttpStore {
    client: reqwest::blocking::Client,
    base_url: String,
    bucket: String,
    api_key: String,
}

impl HttpStore {
    pub fn new(base_url: &str, bucket: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(client, base_url, bucket, api_key))
    }

    /// Use a preconfigured client (proxy, TLS roots, timeouts).
    pub fn with_client(
        client: reqwest::blocking::Client,
        base_url: &str,
        bucket: &str,
        api_key: &str,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }
}

impl ObjectStore for HttpStore {
    fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let response = self
            .client
            .post(self.object_url(path))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Storage(format!("upload of {path} failed with {status}: {body}")));
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{publish, RenderedArtifact};
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    /// Serves exactly one request with `status`, returning the raw request.
    fn one_shot_server(status: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let body = "{\"message\":\"stub\"}";
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            request
        });
        (format!("http://{addr}"), handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn local_store(base_url: &str) -> HttpStore {
        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpStore::with_client(client, base_url, "documents", "service-key")
    }

    fn artifact() -> RenderedArtifact {
        RenderedArtifact {
            path: "offer-letters/T-1042_Asha_Verma.pdf".into(),
            bytes: b"%PDF-1.7 letter".to_vec(),
        }
    }

    #[test]
    fn http_upload_sends_upsert_request() {
        let (base, server) = one_shot_server("200 OK");
        let store = local_store(&base);
        let url = publish(artifact(), &store);
        assert_eq!(
            url,
            Some(format!(
                "{base}/storage/v1/object/public/documents/offer-letters/T-1042_Asha_Verma.pdf"
            ))
        );

        let request = server.join().unwrap();
        assert!(request.starts_with(
            "POST /storage/v1/object/documents/offer-letters/T-1042_Asha_Verma.pdf HTTP/1.1\r\n"
        ));
        let head = request.to_lowercase();
        assert!(head.contains("\r\nx-upsert: true\r\n"));
        assert!(head.contains("\r\napikey: service-key\r\n"));
        assert!(head.contains("\r\nauthorization: bearer service-key\r\n"));
        assert!(head.contains("\r\ncontent-type: application/pdf\r\n"));
        assert!(request.ends_with("\r\n\r\n%PDF-1.7 letter"));
    }

    #[test]
    fn http_upload_rejection_is_soft() {
        let (base, server) = one_shot_server("503 Service Unavailable");
        let store = local_store(&base);
        let err = store
            .put("offer-letters/x.pdf", b"%PDF-", PDF_CONTENT_TYPE)
            .unwrap_err();
        assert!(matches!(&err, Error::Storage(msg) if msg.contains("503")), "{err}");
        server.join().unwrap();

        let (base, server) = one_shot_server("503 Service Unavailable");
        assert_eq!(publish(artifact(), &local_store(&base)), None);
        server.join().unwrap();
    }

    #[test]
    fn path_replaces_spaces() {
        assert_eq!(
            artifact_path("offer-letters", "T-1042", "Asha  Rani Verma"),
            "offer-letters/T-1042_Asha_Rani_Verma.pdf"
        );
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryStore::new("mem://docs/");
        store.put("a/b.pdf", b"one", PDF_CONTENT_TYPE).unwrap();
        store.put("a/b.pdf", b"two", PDF_CONTENT_TYPE).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a/b.pdf").unwrap(), b"two");
        assert_eq!(store.public_url("a/b.pdf"), "mem://docs/a/b.pdf");
    }

    #[test]
    fn local_store_writes_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "https://cdn.example/docs");
        store.put("certs/7_Ravi_Kumar.pdf", b"%PDF-1", PDF_CONTENT_TYPE).unwrap();
        store.put("certs/7_Ravi_Kumar.pdf", b"%PDF-2", PDF_CONTENT_TYPE).unwrap();
        let written = std::fs::read(dir.path().join("certs/7_Ravi_Kumar.pdf")).unwrap();
        assert_eq!(written, b"%PDF-2");
        // Only the final object, no stray temp files.
        assert_eq!(std::fs::read_dir(dir.path().join("certs")).unwrap().count(), 1);
        assert_eq!(
            store.public_url("certs/7_Ravi_Kumar.pdf"),
            "https://cdn.example/docs/certs/7_Ravi_Kumar.pdf"
        );
    }

    #[test]
    fn local_store_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "file://x");
        assert!(store.put("../evil.pdf", b"x", PDF_CONTENT_TYPE).is_err());
        assert!(store.put("/abs.pdf", b"x", PDF_CONTENT_TYPE).is_err());
        assert!(store.put("", b"x", PDF_CONTENT_TYPE).is_err());
    }

    #[test]
    fn http_store_urls() {
        let store = HttpStore::new("https://proj.example.co/", "documents", "key").unwrap();
        assert_eq!(
            store.object_url("offer-letters/1_A.pdf"),
            "https://proj.example.co/storage/v1/object/documents/offer-letters/1_A.pdf"
        );
        assert_eq!(
            store.public_url("offer-letters/1_A.pdf"),
            "https://proj.example.co/storage/v1/object/public/documents/offer-letters/1_A.pdf"
        );
    }
}
