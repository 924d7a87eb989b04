pub mod api;
pub mod auth;
pub mod error;

use crate::assistant::Assistant;
use crate::cli::Args;
use crate::server::auth::IdentityResolver;

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{ info, error };

pub struct Server {
    addr: String,
    state: api::AppState,
    args: Args,
}

impl Server {
    pub fn new(
        addr: String,
        assistant: Arc<Assistant>,
        resolver: Arc<dyn IdentityResolver>,
        args: Args
    ) -> Self {
        Self {
            addr,
            state: api::AppState::new(assistant, resolver),
            args,
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let app = api::build_router(self.state.clone());

        if self.args.enable_tls {
            let (cert_path, key_path) = match (
                &self.args.tls_cert_path,
                &self.args.tls_key_path,
            ) {
                (Some(cert), Some(key)) => (cert, key),
                _ => {
                    error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                    return Err("TLS enabled without cert/key".into());
                }
            };

            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                cert_path,
                key_path
            ).await?;

            info!("HTTPS server listening on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        } else {
            info!("HTTP server listening on: http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}
