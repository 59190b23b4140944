#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use porter::config::Config;
use porter::http::connection::{Connection, ConnectionLimits};
use porter::site::Site;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub struct TestSite {
    pub dir: TempDir,
    pub cfg: Config,
    pub site: Arc<Site>,
}

impl TestSite {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub async fn get(&self, target: &str) -> Reply {
        let raw = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", target);
        Reply::parse(&self.send(raw.as_bytes()).await)
    }

    pub async fn send(&self, raw: &[u8]) -> Vec<u8> {
        exchange(self.site.clone(), ConnectionLimits::from_config(&self.cfg), raw).await
    }
}

/// Document root with `files` (relative path, contents), `/bin/sh` as the
/// interpreter and `sh` as the script extension.
pub fn site_with(files: &[(&str, &[u8])], tweak: impl FnOnce(&mut Config)) -> TestSite {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    let mut cfg = Config::default();
    cfg.site.document_root = dir.path().to_path_buf();
    cfg.script.interpreter = "/bin/sh".into();
    cfg.script.extensions = vec!["sh".to_string()];
    tweak(&mut cfg);

    let site = Arc::new(Site::new(&cfg).unwrap());
    TestSite { dir, cfg, site }
}

/// Serves exactly one connection on a fresh local listener.
pub async fn exchange(site: Arc<Site>, limits: ConnectionLimits, raw: &[u8]) -> Vec<u8> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        Connection::new(socket, site, limits).run().await
    });

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(raw).await.unwrap();

    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();
    drop(client);

    server.await.unwrap().unwrap();
    response
}

#[derive(Debug)]
pub struct Reply {
    pub head: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn parse(bytes: &[u8]) -> Self {
        let split = bytes
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("response has no header terminator");
        let head = String::from_utf8(bytes[..split + 4].to_vec()).unwrap();
        let body = bytes[split + 4..].to_vec();

        let mut lines = head.split("\r\n");
        let status = lines
            .next()
            .and_then(|line| line.split(' ').nth(1))
            .and_then(|code| code.parse().ok())
            .expect("bad status line");
        let headers = lines
            .filter(|line| !line.is_empty())
            .filter_map(|line| line.split_once(": "))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            head,
            status,
            headers,
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
