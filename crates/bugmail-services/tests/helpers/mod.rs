//! Test helpers: wire a submission pipeline against a mock media host and the
//! lettre stub transport.
//!
//! Run from workspace root: `cargo test -p bugmail-services --test submission_test`.

use bugmail_core::Config;
use bugmail_services::{CloudinaryHost, EmailDispatcher, SubmissionService};
use lettre::transport::stub::AsyncStubTransport;
use mockito::ServerGuard;
use std::collections::HashMap;
use std::sync::Arc;

pub struct TestPipeline {
    pub server: ServerGuard,
    pub mailer: Arc<EmailDispatcher<AsyncStubTransport>>,
    pub service: SubmissionService,
}

pub fn test_config(api_base: &str) -> Config {
    let vars: HashMap<&str, String> = [
        ("TO_EMAILS", "QA Team <qa@example.com>, dev@example.com"),
        ("SMTP_SERVER", "localhost"),
        ("SMTP_SECURITY", "none"),
        ("SMTP_FROM", "Bug Reporter <bugs@example.com>"),
        ("CLOUDINARY_CLOUD_NAME", "demo"),
        ("CLOUDINARY_API_KEY", "key123"),
        ("CLOUDINARY_API_SECRET", "abcd"),
        ("CLOUDINARY_API_BASE", api_base),
    ]
    .into_iter()
    .map(|(k, v)| (k, v.to_string()))
    .collect();

    Config::from_vars(|key| vars.get(key).cloned()).expect("test config")
}

/// Pipeline whose SMTP side records messages instead of sending them.
pub async fn setup_pipeline() -> TestPipeline {
    let server = mockito::Server::new_async().await;
    let config = test_config(&server.url());

    let host = CloudinaryHost::new(config.media_host().clone()).expect("media host");
    let from = "Bug Reporter <bugs@example.com>".parse().expect("sender");
    let mailer = Arc::new(EmailDispatcher::with_transport(
        AsyncStubTransport::new_ok(),
        from,
    ));
    let service = SubmissionService::new(config, Arc::new(host), mailer.clone());

    TestPipeline {
        server,
        mailer,
        service,
    }
}
