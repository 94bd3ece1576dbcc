use thiserror::Error;

/// StoreError
///
/// Failure of a single data-store call. Every variant is terminal for the request;
/// the calling gate's `FetchFailurePolicy` decides what the visitor sees.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data store unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("data store answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected row shape: {0}")]
    Decode(#[from] serde_json::Error),

    /// The elevated lookup was asked to run without a service-role key configured.
    #[error("service-role credential is not configured")]
    MissingServiceCredential,
}

/// Denial
///
/// Why a gate turned a visitor away. Carried on every redirect decision so logs can tell
/// the cases apart even when two reasons share a redirect target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("no session identity")]
    Unauthenticated,

    #[error("identity lacks the required attribute")]
    Unauthorized,

    #[error("no authorization record for identity")]
    MissingRecord,

    #[error("no active ban for identity")]
    BanInactive,

    #[error("authorization record could not be fetched")]
    UpstreamFetchFailure,
}
