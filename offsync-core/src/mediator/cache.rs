// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Response cache
//!
//! Named caches stored as directories under one root. Each entry is a JSON
//! file named after the SHA-256 of the request identity, written atomically
//! so a crash never leaves a partial response behind. Only GET requests are
//! matched or stored.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use ring::digest::{digest, SHA256};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::error::{CacheError, MediatorError};
use super::fetcher::Fetcher;
use super::request::{Request, Response, ResponseType};

/// On-disk form of a cached response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedEntry {
    url: String,
    status: u16,
    headers: Vec<(String, String)>,
    /// Base64 body.
    body: String,
    kind: ResponseType,
    stored_at: u64,
}

impl CachedEntry {
    fn from_response(key: String, response: &Response) -> Self {
        let headers = response
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        CachedEntry {
            url: key,
            status: response.status.as_u16(),
            headers,
            body: BASE64.encode(&response.body),
            kind: response.kind,
            stored_at: crate::now_millis(),
        }
    }

    fn into_response(self) -> Result<Response, CacheError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.append(name, value);
            }
        }

        Ok(Response {
            status: StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK),
            headers,
            body: BASE64.decode(self.body.as_bytes())?,
            kind: self.kind,
        })
    }
}

/// All named caches under one directory.
#[derive(Debug, Clone)]
pub struct CacheStorage {
    root: PathBuf,
}

impl CacheStorage {
    /// Opens the cache root, creating it if needed.
    pub fn new(root: &Path) -> Result<Self, CacheError> {
        fs::create_dir_all(root)?;
        Ok(CacheStorage {
            root: root.to_path_buf(),
        })
    }

    /// Opens (creating if needed) the named cache.
    pub fn open(&self, name: &str) -> Result<Cache, CacheError> {
        let dir = self.cache_dir(name)?;
        fs::create_dir_all(&dir)?;
        Ok(Cache {
            name: name.to_string(),
            dir,
        })
    }

    /// True if the named cache exists.
    pub fn has(&self, name: &str) -> bool {
        self.cache_dir(name).map(|d| d.is_dir()).unwrap_or(false)
    }

    /// Names of all existing caches, sorted.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Deletes the named cache. Returns false if it did not exist.
    pub fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let dir = self.cache_dir(name)?;
        if !dir.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        Ok(true)
    }

    fn cache_dir(&self, name: &str) -> Result<PathBuf, CacheError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !valid {
            return Err(CacheError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

/// One named cache.
#[derive(Debug, Clone)]
pub struct Cache {
    name: String,
    dir: PathBuf,
}

impl Cache {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stored response for a GET request.
    ///
    /// Unreadable entries are treated as misses.
    pub fn match_request(&self, request: &Request) -> Option<Response> {
        if request.method != Method::GET {
            return None;
        }
        let data = fs::read(self.entry_path(&request.cache_key())).ok()?;
        let entry: CachedEntry = match serde_json::from_slice(&data) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(cache = %self.name, error = %e, "ignoring corrupt cache entry");
                return None;
            }
        };
        entry.into_response().ok()
    }

    /// Stores a response for a GET request, replacing any previous one.
    /// Other methods are ignored.
    pub fn put(&self, request: &Request, response: &Response) -> Result<(), CacheError> {
        if request.method != Method::GET {
            return Ok(());
        }
        let key = request.cache_key();
        let path = self.entry_path(&key);
        let entry = CachedEntry::from_response(key, response);
        atomic_write(&path, &serde_json::to_vec(&entry)?)
    }

    /// Fetches every request and stores the results.
    ///
    /// Nothing is stored unless every fetch succeeds with status 200.
    pub async fn add_all<F>(&self, fetcher: &F, requests: &[Request]) -> Result<(), MediatorError>
    where
        F: Fetcher + ?Sized,
    {
        let mut fetched = Vec::with_capacity(requests.len());
        for request in requests {
            let response = fetcher.fetch(request).await?;
            if response.status != StatusCode::OK {
                return Err(MediatorError::Precache {
                    url: request.url.to_string(),
                    status: response.status.as_u16(),
                });
            }
            fetched.push(response);
        }

        for (request, response) in requests.iter().zip(&fetched) {
            self.put(request, response)?;
        }
        Ok(())
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let hash = digest(&SHA256, key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(hash.as_ref())))
    }
}

/// Atomic file write: a uniquely named temp file in the same directory,
/// then renamed over `path`. Concurrent writers of one entry never share a
/// temp file.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(data)?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use url::Url;

    fn request(path: &str) -> Request {
        Request::get(Url::parse("http://app.test").unwrap().join(path).unwrap())
    }

    #[test]
    fn test_atomic_write() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("entry.json");

        atomic_write(&path, b"hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_concurrent_puts_of_one_entry_all_succeed() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path()).unwrap();
        let writers: Vec<_> = (0..8)
            .map(|i| {
                let cache = storage.open("v1").unwrap();
                std::thread::spawn(move || {
                    let body = format!("body-{}", i);
                    for _ in 0..20 {
                        let response =
                            Response::new(StatusCode::OK, body.as_bytes(), ResponseType::Basic);
                        cache.put(&request("/shared"), &response).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let cache = storage.open("v1").unwrap();
        assert_eq!(cache.len(), 1);
        let stored = cache.match_request(&request("/shared")).unwrap();
        assert!(stored.text_body().starts_with("body-"));
        assert_eq!(fs::read_dir(temp.path().join("v1")).unwrap().count(), 1);
    }

    #[test]
    fn test_put_then_match_preserves_response() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path()).unwrap();
        let cache = storage.open("v1").unwrap();
        let response = Response::new(StatusCode::OK, vec![0u8, 159, 146, 150], ResponseType::Basic)
            .with_header(
                reqwest::header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            );

        cache.put(&request("/blob"), &response).unwrap();

        assert_eq!(cache.match_request(&request("/blob")), Some(response));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_post_is_never_cached() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path()).unwrap();
        let cache = storage.open("v1").unwrap();
        let url = Url::parse("http://app.test/api/items").unwrap();
        let post = Request::post(url, "{}");

        cache
            .put(&post, &Response::new(StatusCode::OK, "ok", ResponseType::Basic))
            .unwrap();

        assert!(cache.is_empty());
        assert!(cache.match_request(&post).is_none());
    }

    #[test]
    fn test_keys_and_delete() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path()).unwrap();
        storage.open("v2").unwrap();
        storage.open("v1").unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["v1", "v2"]);
        assert!(storage.delete("v1").unwrap());
        assert!(!storage.delete("v1").unwrap());
        assert!(!storage.has("v1"));
        assert!(storage.has("v2"));
    }

    #[test]
    fn test_rejects_path_like_names() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path()).unwrap();

        assert!(matches!(
            storage.open("../escape"),
            Err(CacheError::InvalidName(_))
        ));
        assert!(!storage.has(""));
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let storage = CacheStorage::new(temp.path()).unwrap();
        let cache = storage.open("v1").unwrap();
        let req = request("/page");
        fs::write(cache.entry_path(&req.cache_key()), b"{not json").unwrap();

        assert!(cache.match_request(&req).is_none());
    }
}
