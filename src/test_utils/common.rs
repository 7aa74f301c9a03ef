use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

use crate::proto::Set;
use crate::proxystore::ProxyStore;

static LOGGER_INIT: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

/// Small protobuf value used as store payload in tests.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TestInfo {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(uint32, tag = "2")]
    pub port: u32,
}

pub fn info(
    name: &str,
    port: u32,
) -> TestInfo {
    TestInfo {
        name: name.to_string(),
        port,
    }
}

/// Marks every set as synced in one batch.
pub fn sync_all(store: &ProxyStore<TestInfo>) {
    store.update(|tx| {
        for set in Set::ALL {
            tx.set_sync(set, true);
        }
    });
}
