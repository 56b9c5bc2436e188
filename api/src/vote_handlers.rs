//! API handlers for vote casting, results and chain verification

use crate::auth::AuthenticatedVoter;
use crate::{ApiError, ApiResult, ApiState};
use axum::{extract::State, Json};
use securechain_core::{Block, ChainVerification, Party};
use securechain_crypto::voter_digest;
use serde::{Deserialize, Serialize};
use tracing as log;

#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    pub party_id: String,
}

#[derive(Debug, Serialize)]
pub struct CastVoteResponse {
    pub success: bool,
    pub block: Block,
}

#[derive(Debug, Serialize)]
pub struct PartyTally {
    pub party: Party,
    pub votes: u64,
}

#[derive(Debug, Serialize)]
pub struct ResultsSummary {
    pub total_votes: u64,
    pub tallies: Vec<PartyTally>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub height: u64,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct NodeInfoResponse {
    pub public_key: String,
    pub height: u64,
    pub difficulty: usize,
    pub dev_mode: bool,
    pub parties: Vec<Party>,
}

/// Cast a vote: eligibility gate, then the ledger append.
///
/// Party validity and the already-voted check happen here; the ledger only
/// enforces ordering and integrity. The proof-of-work search runs on the
/// blocking pool so the read path stays responsive.
pub async fn cast_vote(
    State(state): State<ApiState>,
    voter: AuthenticatedVoter,
    Json(request): Json<CastVoteRequest>,
) -> ApiResult<Json<CastVoteResponse>> {
    let party = state
        .parties
        .get(&request.party_id)
        .ok_or_else(|| ApiError::InvalidParty(request.party_id.clone()))?;

    if state.voters.has_voted(&voter.mobile).await {
        return Err(ApiError::AlreadyVoted);
    }

    let voter_id = voter_digest(&voter.mobile);
    let ledger = state.ledger.clone();
    let party_id = party.id.clone();

    let block = tokio::task::spawn_blocking(move || ledger.append(&party_id, &voter_id))
        .await
        .map_err(|e| ApiError::Internal(format!("append task failed: {e}")))??;

    // The block is durable; only now does the voter stop being eligible.
    if let Err(e) = state.voters.mark_voted(&voter.mobile).await {
        log::error!(
            mobile = %voter.mobile,
            index = block.index,
            error = %e,
            "vote recorded but voter roll update failed"
        );
        return Err(ApiError::Internal(
            "vote recorded but voter roll update failed".to_string(),
        ));
    }

    log::info!(
        index = block.index,
        party_id = %block.party_id,
        nonce = block.nonce,
        "vote_recorded"
    );

    Ok(Json(CastVoteResponse {
        success: true,
        block,
    }))
}

/// The full chain, ascending by index.
pub async fn get_results(State(state): State<ApiState>) -> ApiResult<Json<Vec<Block>>> {
    Ok(Json(state.ledger.blocks()))
}

/// Vote counts per party, joined with the ballot catalog.
pub async fn get_results_summary(
    State(state): State<ApiState>,
) -> ApiResult<Json<ResultsSummary>> {
    let counts = state.ledger.tally();

    let tallies = state
        .parties
        .parties()
        .iter()
        .map(|party| PartyTally {
            party: party.clone(),
            votes: counts.get(&party.id).copied().unwrap_or(0),
        })
        .collect();

    Ok(Json(ResultsSummary {
        total_votes: state.ledger.height(),
        tallies,
    }))
}

/// Recompute the chain invariants over the current snapshot.
pub async fn get_chain_verification(
    State(state): State<ApiState>,
) -> ApiResult<Json<ChainVerification>> {
    let verification = state.ledger.verify();
    if !verification.valid {
        log::warn!(
            first_invalid_index = ?verification.first_invalid_index,
            fault = ?verification.fault,
            "chain_verification_failed"
        );
    }
    Ok(Json(verification))
}

pub async fn health_check(State(state): State<ApiState>) -> ApiResult<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy",
        height: state.ledger.height(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }))
}

pub async fn get_node_info(State(state): State<ApiState>) -> ApiResult<Json<NodeInfoResponse>> {
    Ok(Json(NodeInfoResponse {
        public_key: state.keypair.public_key_hex(),
        height: state.ledger.height(),
        difficulty: state.ledger.difficulty(),
        dev_mode: state.dev_mode,
        parties: state.parties.parties().to_vec(),
    }))
}
