//! Cancellable delayed actions for type-ahead search.
//!
//! Every `schedule` aborts the pending task and spawns a new one that sleeps
//! for the quiet window. When it wakes it runs only if no newer task has been
//! scheduled in the meantime. The task receives a [`Ticket`] so it can check
//! again before publishing anything.
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::browse::BrowseService;
use crate::models::SearchResults;

#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl Ticket {
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::Acquire) == self.generation
    }
}

#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    latest: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            latest: Arc::new(AtomicU64::new(0)),
            pending: None,
        }
    }

    pub fn schedule<F, Fut>(&mut self, task: F)
    where
        F: FnOnce(Ticket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let ticket = Ticket {
            generation: self.latest.fetch_add(1, Ordering::AcqRel) + 1,
            latest: self.latest.clone(),
        };
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !ticket.is_current() {
                return;
            }
            task(ticket).await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Search box state: keystrokes in, latest results out.
pub struct SearchSession {
    browse: BrowseService,
    debouncer: Debouncer,
    results: Arc<watch::Sender<SearchResults>>,
}

impl SearchSession {
    pub fn new(browse: BrowseService, delay: Duration) -> Self {
        let (tx, _rx) = watch::channel(SearchResults::default());
        Self {
            browse,
            debouncer: Debouncer::new(delay),
            results: Arc::new(tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchResults> {
        self.results.subscribe()
    }

    pub fn latest(&self) -> SearchResults {
        self.results.borrow().clone()
    }

    pub fn input(&mut self, text: &str) {
        let browse = self.browse.clone();
        let results = self.results.clone();
        let query = text.to_string();
        self.debouncer.schedule(move |ticket| async move {
            debug!("Running debounced search");
            let records = browse.search(&query).await;
            if ticket.is_current() {
                results.send_replace(SearchResults {
                    query,
                    results: records,
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogClient, CatalogTransport, FetchError, TransportResponse};
    use crate::config::CatalogConfig;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    const WINDOW: Duration = Duration::from_millis(300);

    struct SearchTransport {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CatalogTransport for SearchTransport {
        async fn get(
            &self,
            _url: &str,
            query: &[(String, String)],
        ) -> Result<TransportResponse, FetchError> {
            let q = query
                .iter()
                .find(|(k, _)| k == "query")
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            self.queries.lock().unwrap().push(q.clone());
            Ok(TransportResponse {
                status: 200,
                body: json!({ "results": [{ "id": 1, "title": q, "media_type": "movie" }] })
                    .to_string(),
            })
        }
    }

    fn session() -> (SearchSession, Arc<SearchTransport>) {
        let transport = Arc::new(SearchTransport {
            queries: Mutex::new(Vec::new()),
        });
        let config = CatalogConfig::new(vec!["k1".to_string()]);
        let catalog = CatalogClient::new(&config, transport.clone()).unwrap();
        let browse = BrowseService::new(Arc::new(catalog));
        (SearchSession::new(browse, WINDOW), transport)
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_keystroke_in_the_window_runs() {
        let hits = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(String::new()));
        let mut debouncer = Debouncer::new(WINDOW);

        for value in ["a", "b", "c"] {
            let hits = hits.clone();
            let last = last.clone();
            debouncer.schedule(move |_| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                *last.lock().unwrap() = value.to_string();
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(WINDOW).await;

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(*last.lock().unwrap(), "c");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_task() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(WINDOW);
        let counter = hits.clone();
        debouncer.schedule(move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel();
        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn typing_sends_one_search_for_the_final_query() {
        let (mut session, transport) = session();
        for text in ["ab", "abc", "abcd"] {
            session.input(text);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(WINDOW * 2).await;

        assert_eq!(*transport.queries.lock().unwrap(), vec!["abcd".to_string()]);
        let latest = session.latest();
        assert_eq!(latest.query, "abcd");
        assert_eq!(latest.results.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn short_query_clears_results_without_network() {
        let (mut session, transport) = session();
        session.input("matrix");
        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(session.latest().results.len(), 1);

        session.input("ma");
        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(transport.queries.lock().unwrap().len(), 1);
        let latest = session.latest();
        assert_eq!(latest.query, "ma");
        assert!(latest.results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_out_queries_each_run() {
        let (mut session, transport) = session();
        let mut rx = session.subscribe();
        session.input("alien");
        tokio::time::sleep(WINDOW * 2).await;
        session.input("aliens");
        tokio::time::sleep(WINDOW * 2).await;

        assert_eq!(
            *transport.queries.lock().unwrap(),
            vec!["alien".to_string(), "aliens".to_string()]
        );
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().query, "aliens");
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_for_the_final_query_sees_its_results() {
        let (mut session, transport) = session();
        let mut rx = session.subscribe();
        for text in ["blad", "blade", "blade runner"] {
            session.input(text);
        }
        let settled = rx
            .wait_for(|results| results.query == "blade runner")
            .await
            .unwrap()
            .clone();
        assert_eq!(settled.results.len(), 1);
        assert_eq!(
            *transport.queries.lock().unwrap(),
            vec!["blade runner".to_string()]
        );
    }
}
