use tokio::sync::broadcast;

/// Capacity of the session event channel. Slow subscribers see `Lagged`.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Session changes broadcast to every subscriber of an `ApiClient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Login or OTP verification stored a new token pair
    LoggedIn,
    /// The access token was replaced after a refresh
    TokensRefreshed,
    /// The user logged out
    LoggedOut,
    /// Credentials were rejected for good and have been cleared
    AuthenticationLost,
}

pub fn channel() -> broadcast::Sender<SessionEvent> {
    broadcast::channel(EVENT_CHANNEL_CAPACITY).0
}
