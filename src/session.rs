//! Cookie-authenticated HTTP sessions.
//!
//! A [`Session`] is one logical identity: it reuses a single cookie collection
//! across all of its requests. Every `get`/`post` attaches the stored cookies as
//! a `Cookie` header (entries joined with `"; "`, in stored order). Cookies the
//! server sends back are only stored when the caller commits them through
//! [`SessionResponse::save_session`], or explicitly via
//! [`Session::save_session_from_cookies`].
//!
//! # Concurrency model
//! - `Session` is a cheap handle (`Arc` inside); clones share the same cookies.
//! - The cookie collection is loaded from the store on first use. Concurrent
//!   first uses load it exactly once.
//! - Reading cookies, sending the request and committing the response are
//!   separate steps. Callers that need them to be atomic must serialize their
//!   own calls on a session.
//!
//! # Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use gosub_session::cookies::JsonCookieStore;
//! use gosub_session::net::{HttpClient, RequestOptions};
//! use gosub_session::session::Session;
//!
//! # async fn run() -> gosub_session::errors::Result<()> {
//! let client = HttpClient::default();
//! let session = Session::new(client, Arc::new(JsonCookieStore::new("cookies.json".into())));
//!
//! let resp = session
//!     .post("https://example.com/login", &serde_json::json!({"u": "name"}), RequestOptions::new())
//!     .await?;
//! if resp.is_success() {
//!     resp.save_session().await?;
//! }
//!
//! let page = session.get("https://example.com/account", RequestOptions::new()).await?;
//! println!("{}", page.data);
//! # Ok(()) }
//! ```

use std::sync::Arc;

use http::header::{HeaderValue, COOKIE};
use http::Method;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard, OnceCell};

use crate::cookies::{CookieCollection, CookieStoreHandle};
use crate::errors::{Result, SessionError};
use crate::net::{HttpClient, RequestOptions, SessionResponse};

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: HttpClient,
    store: CookieStoreHandle,
    cookies: OnceCell<Mutex<CookieCollection>>,
}

/// Body of an outgoing request.
enum Body<'a, T: ?Sized> {
    None,
    Json(&'a T),
    Form(&'a T),
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.inner.store.name())
            .field("cookies_loaded", &self.inner.cookies.initialized())
            .finish()
    }
}

impl Session {
    /// Creates a session using the shared `client` and cookies from `store`.
    ///
    /// The store is not read until the first request (or cookie access).
    pub fn new(client: HttpClient, store: CookieStoreHandle) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                client,
                store,
                cookies: OnceCell::new(),
            }),
        }
    }

    pub fn client(&self) -> &HttpClient {
        &self.inner.client
    }

    pub fn store(&self) -> &CookieStoreHandle {
        &self.inner.store
    }

    /// Returns the session's cookie collection, loading it on first access.
    ///
    /// The guard must not be held across a request on the same session.
    pub async fn cookies(&self) -> Result<MutexGuard<'_, CookieCollection>> {
        let cookies = self
            .inner
            .cookies
            .get_or_try_init(|| async {
                let collection = CookieCollection::load(self.inner.store.clone()).await?;
                Ok::<_, SessionError>(Mutex::new(collection))
            })
            .await?;
        Ok(cookies.lock().await)
    }

    /// Ordered copy of the current cookie entries.
    pub async fn cookies_snapshot(&self) -> Result<Vec<String>> {
        Ok(self.cookies().await?.get().to_vec())
    }

    /// The exact `Cookie` header value the next request would carry.
    pub async fn cookie_header(&self) -> Result<String> {
        Ok(self.cookies().await?.header_value())
    }

    /// Issues a GET request with the session cookies attached.
    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<SessionResponse> {
        self.send::<()>(Method::GET, url, Body::None, options).await
    }

    /// Issues a POST request with `data` serialized as a JSON body.
    pub async fn post<T: Serialize + ?Sized>(&self, url: &str, data: &T, options: RequestOptions) -> Result<SessionResponse> {
        self.send(Method::POST, url, Body::Json(data), options).await
    }

    /// Issues a POST request with `data` encoded as `application/x-www-form-urlencoded`.
    pub async fn post_form<T: Serialize + ?Sized>(&self, url: &str, data: &T, options: RequestOptions) -> Result<SessionResponse> {
        self.send(Method::POST, url, Body::Form(data), options).await
    }

    /// Replaces all stored cookies with `cookies` and persists them.
    ///
    /// This is the low-level commit primitive; there is no merge with the
    /// previous entries. Nothing changes in memory unless the store accepted
    /// the new entries.
    pub async fn save_session_from_cookies(&self, cookies: Vec<String>) -> Result<()> {
        let mut collection = self.cookies().await?;
        collection.commit(cookies).await?;
        log::debug!("session committed with {} cookie(s)", collection.len());
        Ok(())
    }

    /// Clears all cookies and persists the empty state (hard logout).
    ///
    /// If the store fails, the session keeps its cookies.
    pub async fn remove_session(&self) -> Result<()> {
        let mut collection = self.cookies().await?;
        collection.commit(Vec::new()).await?;
        log::debug!("session removed");
        Ok(())
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Body<'_, T>,
        options: RequestOptions,
    ) -> Result<SessionResponse> {
        let client = self.inner.client.acquire().await?;
        let url = url::Url::parse(url)?;

        let (cookie_header, cookie_count) = {
            let cookies = self.cookies().await?;
            (cookies.header_value(), cookies.len())
        };
        let cookie_header = HeaderValue::from_str(&cookie_header)
            .map_err(|e| SessionError::InvalidHeader(format!("stored cookies: {e}")))?;

        let mut req = client
            .request(method.clone(), url.clone())
            .headers(options.forwarded_headers());

        if !options.query.is_empty() {
            req = req.query(&options.query);
        }
        if let Some(timeout) = options.timeout {
            req = req.timeout(timeout);
        }
        req = match body {
            Body::None => req,
            Body::Json(data) => req.json(data),
            Body::Form(data) => req.form(data),
        };
        // set last so nothing above can replace it
        req = req.header(COOKIE, cookie_header);

        log::debug!("{} {} ({} cookie(s))", method, url, cookie_count);
        let res = req.send().await?;

        SessionResponse::from_reqwest(res, self.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use http::header::ACCEPT;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::SessionConfig;
    use crate::cookies::{CookieStore, InMemoryCookieStore};
    use crate::errors::CookieStoreError;

    /// Store that counts loads and can be told to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryCookieStore,
        loads: AtomicUsize,
        fail_load: bool,
        fail_save: bool,
    }

    #[async_trait]
    impl CookieStore for FlakyStore {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn load(&self) -> Result<Vec<String>, CookieStoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail_load {
                return Err(CookieStoreError::Io(std::io::Error::other("disk on fire")));
            }
            self.inner.load().await
        }

        async fn save(&self, cookies: &[String]) -> Result<(), CookieStoreError> {
            if self.fail_save {
                return Err(CookieStoreError::Io(std::io::Error::other("read-only disk")));
            }
            self.inner.save(cookies).await
        }
    }

    fn session_with(store: Arc<InMemoryCookieStore>) -> Session {
        Session::new(HttpClient::default(), store)
    }

    async fn last_request(server: &MockServer) -> wiremock::Request {
        server.received_requests().await.unwrap().pop().unwrap()
    }

    fn cookie_of(req: &wiremock::Request) -> Option<&str> {
        req.headers.get(COOKIE).map(|v| v.to_str().unwrap())
    }

    #[tokio::test]
    async fn get_sends_stored_cookies_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hi</html>"))
            .mount(&server)
            .await;

        let session = session_with(Arc::new(InMemoryCookieStore::with_cookies(["a", "b", "c"])));
        let resp = session
            .get(&format!("{}/page", server.uri()), RequestOptions::new())
            .await
            .unwrap();

        assert_eq!(resp.status, 200);
        assert_eq!(resp.data, "<html>hi</html>");

        let req = last_request(&server).await;
        assert_eq!(cookie_of(&req), Some("a; b; c"));
        assert_eq!(req.headers.get(ACCEPT).unwrap(), "text/html");
    }

    #[tokio::test]
    async fn remove_session_sends_empty_cookie_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryCookieStore::with_cookies(["sid=42", "lang=nl"]));
        let session = session_with(store.clone());

        session.remove_session().await.unwrap();
        assert!(store.stored().is_empty());
        assert_eq!(store.saves(), 1);

        session.get(&server.uri(), RequestOptions::new()).await.unwrap();
        let req = last_request(&server).await;
        assert_eq!(cookie_of(&req), Some(""));
    }

    #[tokio::test]
    async fn save_session_commits_response_cookies_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "a=1; Path=/; HttpOnly")
                    .append_header("set-cookie", "b=2"),
            )
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryCookieStore::with_cookies(["old=0"]));
        let session = session_with(store.clone());

        let resp = session
            .get(&format!("{}/login", server.uri()), RequestOptions::new())
            .await
            .unwrap();

        // nothing is committed until asked
        assert!(resp.has_new_cookies());
        assert_eq!(store.stored(), vec!["old=0"]);

        resp.save_session().await.unwrap();
        assert_eq!(store.stored(), vec!["a=1", "b=2"]);
        assert_eq!(session.cookie_header().await.unwrap(), "a=1; b=2");

        resp.save_session().await.unwrap();
        assert_eq!(store.stored(), vec!["a=1", "b=2"]);
        assert_eq!(store.saves(), 2);
    }

    #[tokio::test]
    async fn uncommitted_responses_leave_the_session_alone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).append_header("set-cookie", "sid=anonymous"))
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryCookieStore::with_cookies(["sid=good"]));
        let session = session_with(store.clone());

        let resp = session
            .post(&server.uri(), &serde_json::json!({"u": "name", "p": "wrong"}), RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(resp.status, 401);
        assert!(!resp.is_success());
        drop(resp);

        assert_eq!(session.cookies_snapshot().await.unwrap(), vec!["sid=good"]);
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test]
    async fn save_session_from_cookies_replaces_everything() {
        let store = Arc::new(InMemoryCookieStore::with_cookies(["a=1", "b=2"]));
        let session = session_with(store.clone());

        session.save_session_from_cookies(vec!["x=9".into()]).await.unwrap();

        assert_eq!(store.stored(), vec!["x=9"]);
        assert_eq!(session.cookies_snapshot().await.unwrap(), vec!["x=9"]);
    }

    #[tokio::test]
    async fn post_sends_json_body_and_session_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let session = session_with(Arc::new(InMemoryCookieStore::with_cookies(["sid=42"])));
        let opts = RequestOptions::new()
            .header("Cookie", "sid=forged")
            .unwrap()
            .header("X-Trace", "abc")
            .unwrap();

        let data = serde_json::json!({"u": "name"});
        session
            .post(&format!("{}/login", server.uri()), &data, opts)
            .await
            .unwrap();

        let req = last_request(&server).await;
        assert_eq!(req.headers.get_all(COOKIE).iter().count(), 1);
        assert_eq!(cookie_of(&req), Some("sid=42"));
        assert_eq!(req.headers.get("x-trace").unwrap(), "abc");
        assert_eq!(req.body, serde_json::to_vec(&data).unwrap());
    }

    #[tokio::test]
    async fn post_form_encodes_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let session = session_with(Arc::new(InMemoryCookieStore::new()));
        session
            .post_form(&server.uri(), &[("u", "name"), ("p", "a b")], RequestOptions::new())
            .await
            .unwrap();

        let req = last_request(&server).await;
        assert_eq!(req.body, b"u=name&p=a+b");
        assert_eq!(
            req.headers.get("content-type").unwrap(),
            "application/x-www-form-urlencoded"
        );
    }

    #[tokio::test]
    async fn query_options_are_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let session = session_with(Arc::new(InMemoryCookieStore::new()));
        session
            .get(&format!("{}/search", server.uri()), RequestOptions::new().query("q", "rust"))
            .await
            .unwrap();

        let req = last_request(&server).await;
        assert_eq!(req.url.query(), Some("q=rust"));
    }

    #[tokio::test]
    async fn location_is_surfaced_but_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", "/home")
                    .append_header("set-cookie", "sid=fresh; Path=/"),
            )
            .mount(&server)
            .await;

        let cfg = SessionConfig::builder().max_redirects(0).build().unwrap();
        let store = Arc::new(InMemoryCookieStore::new());
        let session = Session::new(HttpClient::new(cfg).unwrap(), store.clone());

        let resp = session
            .post(&format!("{}/login", server.uri()), &serde_json::json!({}), RequestOptions::new())
            .await
            .unwrap();

        assert_eq!(resp.status, 302);
        assert_eq!(resp.location(), Some("/home"));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);

        resp.save_session().await.unwrap();
        assert_eq!(store.stored(), vec!["sid=fresh"]);
    }

    #[tokio::test]
    async fn malformed_set_cookie_is_rejected_and_nothing_is_saved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "good=1")
                    .append_header("set-cookie", "garbage"),
            )
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryCookieStore::with_cookies(["sid=42"]));
        let session = session_with(store.clone());

        let resp = session.get(&server.uri(), RequestOptions::new()).await.unwrap();
        let err = resp.save_session().await.unwrap_err();

        assert!(matches!(err, SessionError::Storage(CookieStoreError::MalformedSetCookie(_))));
        assert_eq!(store.stored(), vec!["sid=42"]);
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cookies_are_loaded_once() {
        let store = Arc::new(FlakyStore::default());
        let session = Session::new(HttpClient::default(), store.clone());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let session = session.clone();
                tokio::spawn(async move { session.cookie_header().await.unwrap() })
            })
            .collect();
        futures::future::join_all(tasks).await;

        session.cookie_header().await.unwrap();
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn store_is_not_touched_before_first_use() {
        let store = Arc::new(FlakyStore::default());
        let session = Session::new(HttpClient::default(), store.clone());

        assert_eq!(store.loads.load(Ordering::SeqCst), 0);
        assert!(!session.client().is_initialized());
    }

    #[tokio::test]
    async fn load_failure_propagates() {
        let store = Arc::new(FlakyStore { fail_load: true, ..FlakyStore::default() });
        let session = Session::new(HttpClient::default(), store);

        let err = session.get("http://127.0.0.1:9/", RequestOptions::new()).await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(CookieStoreError::Io(_))));
    }

    #[tokio::test]
    async fn failed_saves_propagate_and_keep_the_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).append_header("set-cookie", "sid=bad"))
            .mount(&server)
            .await;

        let store = Arc::new(FlakyStore {
            inner: InMemoryCookieStore::with_cookies(["sid=good"]),
            fail_save: true,
            ..FlakyStore::default()
        });
        let session = Session::new(HttpClient::default(), store);

        let err = session.save_session_from_cookies(vec!["sid=bad".into()]).await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(CookieStoreError::Io(_))));
        assert_eq!(session.cookies_snapshot().await.unwrap(), vec!["sid=good"]);

        let err = session.remove_session().await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(CookieStoreError::Io(_))));
        assert_eq!(session.cookies_snapshot().await.unwrap(), vec!["sid=good"]);

        let resp = session.get(&server.uri(), RequestOptions::new()).await.unwrap();
        let err = resp.save_session().await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(CookieStoreError::Io(_))));
        assert_eq!(session.cookie_header().await.unwrap(), "sid=good");

        let req = last_request(&server).await;
        assert_eq!(cookie_of(&req), Some("sid=good"));
    }

    #[tokio::test]
    async fn stored_cookie_with_line_break_is_an_invalid_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let session = session_with(Arc::new(InMemoryCookieStore::new()));
        session
            .save_session_from_cookies(vec!["a=1\r\nX-Injected: y".into()])
            .await
            .unwrap();

        let err = session.get(&server.uri(), RequestOptions::new()).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidHeader(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn utf8_set_cookie_values_are_committed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", HeaderValue::from_bytes("name=café; Path=/".as_bytes()).unwrap()),
            )
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryCookieStore::new());
        let session = session_with(store.clone());

        let resp = session.get(&server.uri(), RequestOptions::new()).await.unwrap();
        resp.save_session().await.unwrap();

        assert_eq!(store.stored(), vec!["name=café"]);
    }

    #[tokio::test]
    async fn non_utf8_set_cookie_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", HeaderValue::from_bytes(b"name=\xff\xfe").unwrap()),
            )
            .mount(&server)
            .await;

        let store = Arc::new(InMemoryCookieStore::with_cookies(["sid=42"]));
        let session = session_with(store.clone());

        let resp = session.get(&server.uri(), RequestOptions::new()).await.unwrap();
        let err = resp.save_session().await.unwrap_err();

        assert!(matches!(err, SessionError::Storage(CookieStoreError::MalformedSetCookie(_))));
        assert_eq!(store.stored(), vec!["sid=42"]);
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        // bind and drop to get a port nobody listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let session = session_with(Arc::new(InMemoryCookieStore::new()));
        let err = session
            .get(&format!("http://127.0.0.1:{port}/"), RequestOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected() {
        let session = session_with(Arc::new(InMemoryCookieStore::new()));
        let err = session.get("not a url", RequestOptions::new()).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn sessions_share_one_client() {
        let client = HttpClient::default();
        let a = Session::new(client.clone(), Arc::new(InMemoryCookieStore::new()));
        let b = Session::new(client, Arc::new(InMemoryCookieStore::new()));

        let ca = a.client().acquire().await.unwrap();
        let cb = b.client().acquire().await.unwrap();
        assert!(Arc::ptr_eq(&ca, &cb));
    }
}
