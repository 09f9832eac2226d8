use parking_lot::RwLock;
use std::sync::Arc;

/// Shared state type alias
pub type SharedState = Arc<RwLock<SessionState>>;

/// Readiness of the messaging session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    /// Process started, provider has not reported anything yet
    #[default]
    Uninitialized,
    /// Provider issued a pairing code and is waiting for device linking
    AwaitingPairing,
    /// Session is authenticated and able to send messages
    Ready,
    /// Provider lost its session
    Disconnected,
    /// Device linking or re-authentication failed
    AuthFailed,
}

impl Readiness {
    /// Human-readable state tag for the status endpoint
    pub fn as_tag(&self) -> &'static str {
        match self {
            Readiness::Uninitialized => "uninitialized",
            Readiness::AwaitingPairing => "awaiting_pairing",
            Readiness::Ready => "ready",
            Readiness::Disconnected => "disconnected",
            Readiness::AuthFailed => "auth_failed",
        }
    }
}

/// Session lifecycle state
///
/// Exactly one instance per process, mutated only by the provider event
/// consumer. Request handlers read it through [`SessionState::snapshot`].
///
/// Invariant: `pairing_code` is `Some` only while readiness is
/// `AwaitingPairing`; every transition out of that state clears it.
#[derive(Debug, Default)]
pub struct SessionState {
    readiness: Readiness,
    pairing_code: Option<String>,
    last_error: Option<String>,
}

impl SessionState {
    /// Create a new session state in `Uninitialized`
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared state
    pub fn shared() -> SharedState {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Provider issued a (new) pairing code
    pub fn on_pairing_code_issued(&mut self, code: String) {
        self.readiness = Readiness::AwaitingPairing;
        self.pairing_code = Some(code);
        self.last_error = None;
    }

    /// Provider authenticated; not yet ready to send
    pub fn on_authenticated(&mut self) {
        self.last_error = None;
    }

    /// Provider is ready to send messages
    pub fn on_ready(&mut self) {
        self.readiness = Readiness::Ready;
        self.pairing_code = None;
    }

    /// Device linking or re-authentication failed
    pub fn on_auth_failure(&mut self, reason: String) {
        self.readiness = Readiness::AuthFailed;
        self.pairing_code = None;
        self.last_error = Some(reason);
    }

    /// Provider lost its session
    pub fn on_disconnected(&mut self, reason: String) {
        self.readiness = Readiness::Disconnected;
        self.pairing_code = None;
        self.last_error = Some(reason);
    }

    /// Immutable copy of the current state for read-only callers
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            readiness: self.readiness,
            pairing_code: self.pairing_code.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Point-in-time copy of [`SessionState`]
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub readiness: Readiness,
    pub pairing_code: Option<String>,
    pub last_error: Option<String>,
}

impl StateSnapshot {
    /// Whether the session can send messages
    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    /// Whether a pairing code is pending retrieval
    pub fn qr_available(&self) -> bool {
        self.pairing_code.is_some()
    }
}
