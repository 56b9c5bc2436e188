//! Route table for the voting service

use crate::auth_handlers::{send_otp, verify_otp};
use crate::vote_handlers::{
    cast_vote, get_chain_verification, get_node_info, get_results, get_results_summary,
    health_check,
};
use crate::ApiState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn create_routes() -> Router<ApiState> {
    Router::new()
        // Authentication endpoints
        .route("/api/auth/send-otp", post(send_otp))
        .route("/api/auth/verify-otp", post(verify_otp))
        // Voting endpoints
        .route("/api/vote", post(cast_vote))
        .route("/api/results", get(get_results))
        .route("/api/results/summary", get(get_results_summary))
        // Audit endpoints
        .route("/api/verify", get(get_chain_verification))
        .route("/api/node", get(get_node_info))
        // Service endpoints
        .route("/health", get(health_check))
}
