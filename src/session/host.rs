use crate::session::config::{Callbacks, PlayerConfig};
use crate::session::controller::{Player, SessionHandle, TeardownReport};

/// Mount/update/unmount wiring around a [`Player`].
///
/// Holds at most one session. A config change stops the current session before the next one starts.
pub struct PlayerHost {
    player: Player,
    current: Option<(PlayerConfig, SessionHandle)>,
}

impl PlayerHost {
    /// Wrap `player`; nothing plays until [`PlayerHost::update`].
    pub fn new(player: Player) -> Self {
        Self {
            player,
            current: None,
        }
    }

    /// Apply `config`.
    ///
    /// Returns `false` and keeps the running session when `config` equals the current one;
    /// `callbacks` are dropped in that case.
    pub async fn update(&mut self, config: PlayerConfig, callbacks: Callbacks) -> bool {
        if self.current.as_ref().is_some_and(|(c, _)| *c == config) {
            return false;
        }
        if let Some((_, mut handle)) = self.current.take() {
            let report = handle.stop().await;
            tracing::debug!(session = handle.id(), ?report, "config changed, session replaced");
        }
        let handle = self.player.start(config.clone(), callbacks);
        self.current = Some((config, handle));
        true
    }

    /// Stop the current session, if any.
    pub async fn unmount(&mut self) -> Option<TeardownReport> {
        let (_, mut handle) = self.current.take()?;
        Some(handle.stop().await)
    }

    /// Config of the running session.
    pub fn config(&self) -> Option<&PlayerConfig> {
        self.current.as_ref().map(|(c, _)| c)
    }

    /// Id of the running session.
    pub fn session_id(&self) -> Option<u64> {
        self.current.as_ref().map(|(_, h)| h.id())
    }

    /// The wrapped player.
    pub fn player(&self) -> &Player {
        &self.player
    }
}
