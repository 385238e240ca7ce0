//! Runs a Doodlecast relay.
//!
//! ```text
//! doodlecast-relay [ADDR]    # default 127.0.0.1:8080
//! ```

use doodlecast::prelude::*;

#[tokio::main]
async fn main() -> Result<(), DoodlecastError> {
    init_tracing();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());

    let server = RelayServer::builder().bind(&addr).build().await?;
    tracing::info!(addr = %server.local_addr()?, "relay ready");
    server.run().await
}
