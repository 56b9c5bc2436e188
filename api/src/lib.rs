//! SecureChain HTTP service
//!
//! Authentication glue (OTP + session tokens), the voter eligibility gate
//! and the ledger's vote/results/verify surface.

mod auth;
mod auth_handlers;
mod error;
mod otp;
mod routes;
mod state;
mod vote_handlers;
mod voters;

pub use auth::AuthenticatedVoter;
pub use error::{ApiError, ApiResult};
pub use otp::OtpStore;
pub use state::ApiState;
pub use voters::{VoterRecord, VoterRegistry};

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};

pub async fn start_server(
    addr: SocketAddr,
    state: ApiState,
) -> Result<(), Box<dyn std::error::Error>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let app = routes::create_routes().with_state(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
