use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// How a stub path answers.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Route {
    Json(&'static str),
    /// Answers with `status` for the first `failures` hits, then with the body.
    FlakyJson {
        failures: usize,
        status: u16,
        body: &'static str,
    },
    Status(u16),
}

/// A difficulty-table host on 127.0.0.1 that counts hits per path.
pub struct UpstreamStub {
    pub base_url: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl UpstreamStub {
    pub fn spawn(routes: Vec<(&'static str, Route)>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start upstream stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let routes: HashMap<&'static str, Route> = routes.into_iter().collect();
        let hits = Arc::new(Mutex::new(HashMap::<String, usize>::new()));
        let hits_in_server = Arc::clone(&hits);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();
                let hit = {
                    let mut hits = hits_in_server.lock().expect("lock hits");
                    let count = hits.entry(path.clone()).or_insert(0);
                    *count += 1;
                    *count
                };

                let (status, body) = match routes.get(path.as_str()) {
                    Some(Route::Json(body)) => (200, *body),
                    Some(Route::FlakyJson {
                        failures,
                        status,
                        body,
                    }) => {
                        if hit <= *failures {
                            (*status, "temporarily unavailable")
                        } else {
                            (200, *body)
                        }
                    }
                    Some(Route::Status(status)) => (*status, "error"),
                    None => (404, "not found"),
                };

                let header = tiny_http::Header::from_bytes(
                    &b"Content-Type"[..],
                    &b"application/json; charset=utf-8"[..],
                )
                .expect("build header");
                let response = tiny_http::Response::from_string(body)
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            hits,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits
            .lock()
            .expect("lock hits")
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

impl Drop for UpstreamStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
