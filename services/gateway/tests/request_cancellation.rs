mod common;

use async_trait::async_trait;
use common::{sample_template, wait_for_listen};
use gateway::app::{AppState, build_router};
use gateway::config::DEFAULT_MAX_BODY_BYTES;
use gateway::pdp::{DecisionPoint, PdpError};
use gateway::store::TemplateStore;
use gateway::store::memory::InMemoryStore;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tollgate_policy::AuthorizationRequest;

/// Decision point that stalls long enough for the client to give up.
#[derive(Default)]
struct StallingPdp {
    started: Arc<Notify>,
    cancelled: Arc<AtomicBool>,
    completed: Arc<AtomicBool>,
}

#[async_trait]
impl DecisionPoint for StallingPdp {
    async fn query(
        &self,
        _request: &AuthorizationRequest,
        cancel: &CancellationToken,
    ) -> Result<Value, PdpError> {
        // Watched from a detached task: this future is dropped on disconnect.
        let token = cancel.clone();
        let cancelled = self.cancelled.clone();
        tokio::spawn(async move {
            token.cancelled().await;
            cancelled.store(true, Ordering::SeqCst);
        });
        self.started.notify_one();

        tokio::time::sleep(Duration::from_secs(5)).await;
        self.completed.store(true, Ordering::SeqCst);
        Ok(json!({ "allow": true }))
    }

    fn is_configured(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn dropped_client_abandons_the_pdp_query() {
    let pdp = StallingPdp::default();
    let (started, cancelled, completed) = (
        pdp.started.clone(),
        pdp.cancelled.clone(),
        pdp.completed.clone(),
    );
    let store = Arc::new(InMemoryStore::new());
    let state = AppState::new(Arc::new(pdp), store.clone(), DEFAULT_MAX_BODY_BYTES);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind gateway");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, build_router(state).into_make_service()).await;
    });
    wait_for_listen(addr).await;

    let body = serde_json::to_vec(&sample_template("tpl-cancel")).expect("encode");
    let head = format!(
        "POST /v1/templates HTTP/1.1\r\n\
         host: {addr}\r\n\
         content-type: application/json\r\n\
         x-principal-id: alice\r\n\
         x-roles: admin\r\n\
         content-length: {}\r\n\r\n",
        body.len()
    );
    let mut client = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect gateway");
    client.write_all(head.as_bytes()).await.expect("write head");
    client.write_all(&body).await.expect("write body");

    tokio::time::timeout(Duration::from_secs(2), started.notified())
        .await
        .expect("pdp query never started");
    drop(client);

    let deadline = Instant::now() + Duration::from_secs(2);
    while !cancelled.load(Ordering::SeqCst) {
        assert!(Instant::now() < deadline, "pdp query was not cancelled");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!completed.load(Ordering::SeqCst));
    assert_eq!(store.len().await.expect("len"), 0);
}
