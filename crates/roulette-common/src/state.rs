use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the local user is in the register → match → chat cycle.
///
/// `Idle` and `Registered` are passed through once per process; every other
/// state is revisited each round. `PeerDisconnected` and `Errored` end a
/// round and lead back to `Queued` through find-next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Registered,
    Queued,
    Matched,
    Negotiating,
    Connected,
    PeerDisconnected,
    Errored,
}

impl SessionState {
    /// True while a room code and role are committed.
    pub fn in_round(self) -> bool {
        matches!(
            self,
            SessionState::Matched | SessionState::Negotiating | SessionState::Connected
        )
    }

    /// True once the user has a matching-service identity.
    pub fn is_registered(self) -> bool {
        !matches!(self, SessionState::Idle)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Idle, Registered) => true,
            (Idle, _) => false,
            // Any registered state may fail or be restarted with find-next.
            (_, Errored) | (_, Queued) => true,
            (Registered, Matched) | (Queued, Matched) => true,
            // A new match while a round is active replaces it.
            (Matched | Negotiating | Connected, Matched) => true,
            (Matched, Negotiating) => true,
            (Negotiating, Connected) => true,
            (Matched | Negotiating | Connected, PeerDisconnected) => true,
            _ => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Registered => "registered",
            SessionState::Queued => "queued",
            SessionState::Matched => "matched",
            SessionState::Negotiating => "negotiating",
            SessionState::Connected => "connected",
            SessionState::PeerDisconnected => "peer disconnected",
            SessionState::Errored => "errored",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::SessionState::*;
    use super::*;

    #[test]
    fn happy_path_is_allowed() {
        let path = [Idle, Registered, Queued, Matched, Negotiating, Connected, PeerDisconnected, Queued];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn idle_only_moves_to_registered() {
        assert!(!Idle.can_transition_to(Queued));
        assert!(!Idle.can_transition_to(Errored));
        assert!(!Idle.can_transition_to(Matched));
    }

    #[test]
    fn every_registered_state_reaches_queued() {
        for state in [Registered, Queued, Matched, Negotiating, Connected, PeerDisconnected, Errored] {
            assert!(state.can_transition_to(Queued), "{state} -> queued");
        }
    }

    #[test]
    fn cannot_skip_negotiation() {
        assert!(!Matched.can_transition_to(Connected));
        assert!(!Queued.can_transition_to(Negotiating));
        assert!(!Errored.can_transition_to(Connected));
    }

    #[test]
    fn round_membership() {
        assert!(Matched.in_round());
        assert!(Negotiating.in_round());
        assert!(Connected.in_round());
        assert!(!Queued.in_round());
        assert!(!PeerDisconnected.in_round());
    }

    #[test]
    fn registration_flag() {
        assert!(!Idle.is_registered());
        assert!(Errored.is_registered());
    }

    #[test]
    fn display_labels() {
        assert_eq!(PeerDisconnected.to_string(), "peer disconnected");
        assert_eq!(SessionState::default(), Idle);
    }
}
