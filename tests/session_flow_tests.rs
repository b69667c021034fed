//! End-to-end session flow over a real socket: login, identity check, logout.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use cctv_server::config::ServerConfig;
use cctv_server::server::{serve, AppState};

struct TestServer {
    base_url: String,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<anyhow::Result<()>>,
    _root: tempfile::TempDir,
}

impl TestServer {
    /// Start on an ephemeral localhost port with no role passwords configured.
    async fn start() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        std::fs::write(root.path().join("index.html"), "index").expect("write index");
        std::fs::write(root.path().join("cctv.html"), "cameras").expect("write page");

        let config = ServerConfig::from_sources(
            |_| None,
            &[
                "cctv_server".to_string(),
                "--static-dir".to_string(),
                root.path().display().to_string(),
                "--root-dir".to_string(),
                root.path().join("missing").display().to_string(),
            ],
        );
        let state = AppState::from_config(&config);
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind 127.0.0.1:0");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, state, async move {
            let _ = rx.await;
        }));
        Self { base_url: format!("http://{addr}"), stop: Some(tx), handle, _root: root }
    }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

    async fn shutdown(mut self) {
        if let Some(tx) = self.stop.take() { let _ = tx.send(()); }
        let joined = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
        assert!(matches!(joined, Ok(Ok(Ok(())))), "server did not shut down cleanly");
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client")
}

fn session_cookie(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("cctv_sid="))
        .map(str::to_string)
}

#[tokio::test]
async fn admin_default_password_login_me_logout() {
    let srv = TestServer::start().await;
    let http = client();

    let resp = http
        .post(srv.url("/api/login"))
        .json(&json!({"username": "admin", "password": "admin"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let set_cookie = session_cookie(&resp).expect("Set-Cookie present");
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=43200"));
    assert!(!set_cookie.contains("Secure"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({"ok": true, "username": "admin"}));

    let me: Value = http
        .get(srv.url("/api/me"))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me, json!({"authenticated": true, "username": "admin"}));

    let page = http.get(srv.url("/cctv.html")).header(reqwest::header::COOKIE, &cookie).send().await.unwrap();
    assert_eq!(page.status(), 200);
    assert_eq!(page.text().await.unwrap(), "cameras");

    let out = http
        .post(srv.url("/api/logout"))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(out.status(), 200);
    let cleared = session_cookie(&out).expect("clearing Set-Cookie");
    assert!(cleared.starts_with("cctv_sid=;"));
    assert!(cleared.contains("Max-Age=0"));

    let me: Value = http
        .get(srv.url("/api/me"))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me, json!({"authenticated": false, "username": null}));

    let page = http.get(srv.url("/cctv.html")).header(reqwest::header::COOKIE, &cookie).send().await.unwrap();
    assert_eq!(page.status(), 302);
    assert_eq!(page.headers().get(reqwest::header::LOCATION).unwrap(), "/login.html");

    srv.shutdown().await;
}

#[tokio::test]
async fn unconfigured_roles_cannot_log_in() {
    let srv = TestServer::start().await;
    let http = client();
    for user in ["viewer", "manager", "guest"] {
        let resp = http
            .post(srv.url("/api/login"))
            .json(&json!({"username": user, "password": "admin"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401, "{user}");
        assert!(session_cookie(&resp).is_none());
    }
    srv.shutdown().await;
}

#[tokio::test]
async fn cookie_jar_client_follows_the_session() {
    let srv = TestServer::start().await;
    let http = reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let resp = http
        .post(srv.url("/api/login"))
        .json(&json!({"username": "admin", "password": "admin"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let me: Value = http.get(srv.url("/api/me")).send().await.unwrap().json().await.unwrap();
    assert_eq!(me["authenticated"], json!(true));

    http.post(srv.url("/api/logout")).send().await.unwrap();
    let me: Value = http.get(srv.url("/api/me")).send().await.unwrap().json().await.unwrap();
    assert_eq!(me, json!({"authenticated": false, "username": null}));

    srv.shutdown().await;
}
