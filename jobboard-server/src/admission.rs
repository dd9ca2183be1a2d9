//! Per-endpoint request admission
//!
//! Limited routes carry a middleware layer that resolves the caller's
//! identity, runs one sliding-window check and either forwards the request or
//! answers 429 before any handler code (authorization, body parsing, store
//! access) runs.

use crate::error::ApiError;
use crate::metrics::Admission;
use crate::state::SharedState;
use anyhow::anyhow;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::MethodRouter;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Instant;

/// Identity used when the peer address cannot be determined
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// What the limiter keys a caller by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityScope {
    /// Client network address, even when a token is present
    Address,
    /// Authenticated user id, falling back to the address without a valid token
    User,
}

/// Endpoints protected by a sliding window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitedEndpoint {
    SignIn,
    EditPassword,
    DeleteUser,
    SearchResumes,
    SearchVacancies,
    ApplyToVacancy,
    SetStatus,
}

impl LimitedEndpoint {
    pub const ALL: [LimitedEndpoint; 7] = [
        LimitedEndpoint::SignIn,
        LimitedEndpoint::EditPassword,
        LimitedEndpoint::DeleteUser,
        LimitedEndpoint::SearchResumes,
        LimitedEndpoint::SearchVacancies,
        LimitedEndpoint::ApplyToVacancy,
        LimitedEndpoint::SetStatus,
    ];

    /// Route template; one budget covers every concrete path of the route
    pub fn key(self) -> &'static str {
        match self {
            LimitedEndpoint::SignIn => "/user/sign_in",
            LimitedEndpoint::EditPassword => "/user/edit_password",
            LimitedEndpoint::DeleteUser => "/user/delete_user",
            LimitedEndpoint::SearchResumes => "/search/search_resumes",
            LimitedEndpoint::SearchVacancies => "/search/search_vacancies",
            LimitedEndpoint::ApplyToVacancy => "/response/apply_to_vacancy/{vacancy_id}",
            LimitedEndpoint::SetStatus => "/response/set_status/{response_id}",
        }
    }

    pub fn scope(self) -> IdentityScope {
        match self {
            LimitedEndpoint::SignIn => IdentityScope::Address,
            _ => IdentityScope::User,
        }
    }

    /// Environment variable overriding this endpoint's limit
    pub fn env_var(self) -> &'static str {
        match self {
            LimitedEndpoint::SignIn => "JOBBOARD_LIMIT_SIGN_IN",
            LimitedEndpoint::EditPassword => "JOBBOARD_LIMIT_EDIT_PASSWORD",
            LimitedEndpoint::DeleteUser => "JOBBOARD_LIMIT_DELETE_USER",
            LimitedEndpoint::SearchResumes => "JOBBOARD_LIMIT_SEARCH_RESUMES",
            LimitedEndpoint::SearchVacancies => "JOBBOARD_LIMIT_SEARCH_VACANCIES",
            LimitedEndpoint::ApplyToVacancy => "JOBBOARD_LIMIT_APPLY_TO_VACANCY",
            LimitedEndpoint::SetStatus => "JOBBOARD_LIMIT_SET_STATUS",
        }
    }
}

impl fmt::Display for LimitedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Admission behaviour when the limiter store fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Admit the request and log a warning
    Open,
    /// Reject with 503
    #[default]
    Closed,
}

impl FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "open" => Ok(FailurePolicy::Open),
            "closed" => Ok(FailurePolicy::Closed),
            _ => Err(anyhow!(
                "Invalid failure policy: {}. Valid options are: open, closed",
                s
            )),
        }
    }
}

/// Client address used as the limiter identity
///
/// `X-Forwarded-For` (first entry) and then `X-Real-IP` are read only when the
/// peer is a loopback reverse proxy. A loopback value inside those headers is
/// rejected. Any other peer is keyed by its own address.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let peer_ip = peer.map(|addr| addr.ip());

    let forwarded = if peer_ip.is_some_and(|ip| ip.is_loopback()) {
        forwarded_address(headers)
    } else {
        if headers.contains_key(X_FORWARDED_FOR) || headers.contains_key(X_REAL_IP) {
            tracing::debug!(peer = ?peer_ip, "ignoring forwarding headers from untrusted peer");
        }
        None
    };

    forwarded
        .or(peer_ip)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_IDENTITY.to_string())
}

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

fn forwarded_address(headers: &HeaderMap) -> Option<IpAddr> {
    let header_ip = |name: &str| -> Option<IpAddr> {
        headers
            .get(name)?
            .to_str()
            .ok()?
            .split(',')
            .next()?
            .trim()
            .parse()
            .ok()
    };

    let ip = header_ip(X_FORWARDED_FOR).or_else(|| header_ip(X_REAL_IP))?;
    if ip.is_loopback() {
        tracing::warn!(%ip, "rejected loopback address in forwarding header");
        return None;
    }
    Some(ip)
}

/// State handed to one route's admission layer
#[derive(Clone)]
pub struct Gate {
    state: SharedState,
    endpoint: LimitedEndpoint,
}

impl Gate {
    fn identity(&self, request: &Request) -> String {
        if self.endpoint.scope() == IdentityScope::User {
            if let Some(user_id) = self.state.keys.user_id(request.headers()) {
                return user_id.to_string();
            }
        }

        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        client_address(request.headers(), peer)
    }
}

/// Wrap `route` with the admission check of `endpoint`
pub fn limited(
    route: MethodRouter<SharedState>,
    state: &SharedState,
    endpoint: LimitedEndpoint,
) -> MethodRouter<SharedState> {
    let gate = Gate {
        state: state.clone(),
        endpoint,
    };
    route.layer(middleware::from_fn_with_state(gate, admit))
}

async fn admit(State(gate): State<Gate>, request: Request, next: Next) -> Result<Response, ApiError> {
    let identity = gate.identity(&request);
    let limit = gate.state.limits.get(gate.endpoint);
    let started = Instant::now();

    let verdict = gate
        .state
        .limiter
        .check_limit(&identity, gate.endpoint.key(), limit)
        .await;
    let metrics = &gate.state.metrics;

    match verdict {
        Ok(verdict) if verdict.allowed => {
            metrics.record_admission(Admission::Allowed, started.elapsed());
            Ok(next.run(request).await)
        }
        Ok(verdict) => {
            metrics.record_admission(Admission::Denied, started.elapsed());
            Err(ApiError::RateLimited {
                retry_after: verdict.retry_after,
            })
        }
        Err(e) => match gate.state.failure_policy {
            FailurePolicy::Open => {
                tracing::warn!(endpoint = %gate.endpoint, error = %e, "limiter unavailable, admitting");
                metrics.record_admission(Admission::FailedOpen, started.elapsed());
                Ok(next.run(request).await)
            }
            FailurePolicy::Closed => {
                metrics.record_admission(Admission::Errored, started.elapsed());
                Err(ApiError::Unavailable(e.to_string()))
            }
        },
    }
}
