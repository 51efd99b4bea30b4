// Starts a relay once per test binary for client-side integration tests.
#![allow(dead_code)]

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

static RELAY_URL: OnceLock<String> = OnceLock::new();

pub fn ensure_relay() -> &'static str {
    RELAY_URL.get_or_init(|| {
        let published = Arc::new(OnceLock::<String>::new());
        let published_thread = Arc::clone(&published);
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("relay runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral relay port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_thread.set(format!("ws://{addr}/ws"));
                relay_server::run(listener).await.expect("relay failed");
            });
        });

        for _ in 0..200 {
            if let Some(url) = published.get() {
                return url.clone();
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("relay did not start in time");
    })
}
