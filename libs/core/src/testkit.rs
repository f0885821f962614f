//! Helpers shared by unit and integration tests: JSON fixtures and throwaway
//! local HTTP servers standing in for Frame.io, the identity provider and Slack.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("workspace root")
        .to_path_buf()
}

/// Loads a JSON fixture relative to the workspace root.
pub fn load_fixture(path: impl AsRef<Path>) -> Value {
    let full = workspace_root().join(path.as_ref());
    let content = std::fs::read_to_string(&full)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", full.display()));
    serde_json::from_str(&content)
        .unwrap_or_else(|err| panic!("invalid json in {}: {err}", full.display()))
}

/// A router served on an ephemeral localhost port for the lifetime of the value.
pub struct MockServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Returns `None` when binding to localhost is not permitted, so callers can skip.
    pub async fn spawn(app: Router) -> Option<Self> {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(listener) => listener,
            Err(err) => {
                eprintln!("skipping: cannot bind mock server: {err}");
                return None;
            }
        };
        let addr = listener.local_addr().ok()?;
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app.into_make_service()).await {
                eprintln!("mock server error: {err}");
            }
        });
        Some(Self { addr, handle })
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}/{}", self.addr, path.trim_start_matches('/'))
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Collects every JSON body a mock endpoint receives.
#[derive(Clone, Default)]
pub struct Recorder {
    inner: Arc<Mutex<Vec<Value>>>,
}

impl Recorder {
    pub fn push(&self, value: Value) {
        self.inner.lock().unwrap().push(value);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn take(&self) -> Vec<Value> {
        std::mem::take(&mut *self.inner.lock().unwrap())
    }
}
