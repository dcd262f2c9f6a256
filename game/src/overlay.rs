use serde::{Deserialize, Serialize};

use crate::controller::GameEffect;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "camelCase")]
pub enum Overlay {
    #[default]
    Title,
    Playing { paused: bool },
    StageBanner { wave: u32 },
    GameOver { victory: bool },
    Leaderboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OverlayEvent {
    Start,
    TogglePause,
    WaveAdvanced { wave: u32 },
    BannerDone,
    GameOver { victory: bool },
    OpenLeaderboard,
    Back,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlayEffect {
    None,
    StartSession,
    QuitSession,
}

impl Overlay {
    /// Pure transition function for the screen shown over the field.
    ///
    /// Session side effects are reported as an `OverlayEffect` for the caller to apply.
    pub fn handle(self, event: OverlayEvent) -> (Overlay, OverlayEffect) {
        use OverlayEvent as E;
        match (self, event) {
            (Overlay::Title, E::Start) | (Overlay::GameOver { .. }, E::Start) => (
                Overlay::Playing { paused: false },
                OverlayEffect::StartSession,
            ),
            (Overlay::Title, E::OpenLeaderboard) | (Overlay::GameOver { .. }, E::OpenLeaderboard) => {
                (Overlay::Leaderboard, OverlayEffect::None)
            }

            (Overlay::Playing { paused }, E::TogglePause) => {
                (Overlay::Playing { paused: !paused }, OverlayEffect::None)
            }
            (Overlay::Playing { paused: false }, E::WaveAdvanced { wave }) => {
                (Overlay::StageBanner { wave }, OverlayEffect::None)
            }
            (Overlay::StageBanner { .. }, E::BannerDone) => {
                (Overlay::Playing { paused: false }, OverlayEffect::None)
            }
            (Overlay::Playing { .. } | Overlay::StageBanner { .. }, E::GameOver { victory }) => {
                (Overlay::GameOver { victory }, OverlayEffect::None)
            }
            (Overlay::Playing { paused: true }, E::Quit) => {
                (Overlay::Title, OverlayEffect::QuitSession)
            }

            (Overlay::Leaderboard, E::Back) | (Overlay::GameOver { .. }, E::Back) => {
                (Overlay::Title, OverlayEffect::None)
            }

            (state, _) => (state, OverlayEffect::None),
        }
    }

    pub fn is_playing(self) -> bool {
        matches!(self, Overlay::Playing { paused: false })
    }

    pub fn is_paused(self) -> bool {
        matches!(self, Overlay::Playing { paused: true })
    }
}

impl OverlayEvent {
    /// The overlay event a controller effect implies, if any.
    pub fn from_game_effect(effect: &GameEffect) -> Option<OverlayEvent> {
        match effect {
            GameEffect::WaveAdvanced { wave } => Some(OverlayEvent::WaveAdvanced { wave: *wave }),
            GameEffect::GameOver { victory, .. } => Some(OverlayEvent::GameOver {
                victory: *victory,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_from_title_begins_a_session() {
        assert_eq!(
            Overlay::default().handle(OverlayEvent::Start),
            (Overlay::Playing { paused: false }, OverlayEffect::StartSession)
        );
    }

    #[test]
    fn quit_requires_pause_first() {
        let playing = Overlay::Playing { paused: false };
        assert_eq!(playing.handle(OverlayEvent::Quit), (playing, OverlayEffect::None));

        let (paused, _) = playing.handle(OverlayEvent::TogglePause);
        assert!(paused.is_paused());
        assert_eq!(
            paused.handle(OverlayEvent::Quit),
            (Overlay::Title, OverlayEffect::QuitSession)
        );
    }

    #[test]
    fn wave_banner_returns_to_play() {
        let (banner, _) = Overlay::Playing { paused: false }.handle(OverlayEvent::WaveAdvanced { wave: 3 });
        assert_eq!(banner, Overlay::StageBanner { wave: 3 });
        assert!(banner.handle(OverlayEvent::BannerDone).0.is_playing());
    }

    #[test]
    fn game_over_screens_lead_to_leaderboard_and_back() {
        let (over, _) = Overlay::StageBanner { wave: 10 }.handle(OverlayEvent::GameOver { victory: true });
        assert_eq!(over, Overlay::GameOver { victory: true });

        let (board, _) = over.handle(OverlayEvent::OpenLeaderboard);
        assert_eq!(board, Overlay::Leaderboard);
        assert_eq!(board.handle(OverlayEvent::Back).0, Overlay::Title);
        assert_eq!(
            over.handle(OverlayEvent::Start).1,
            OverlayEffect::StartSession
        );
    }

    #[test]
    fn irrelevant_events_are_ignored() {
        assert_eq!(
            Overlay::Title.handle(OverlayEvent::BannerDone),
            (Overlay::Title, OverlayEffect::None)
        );
        assert_eq!(
            Overlay::Leaderboard.handle(OverlayEvent::TogglePause),
            (Overlay::Leaderboard, OverlayEffect::None)
        );
    }

    #[test]
    fn controller_effects_map_to_overlay_events() {
        assert_eq!(
            OverlayEvent::from_game_effect(&GameEffect::WaveAdvanced { wave: 2 }),
            Some(OverlayEvent::WaveAdvanced { wave: 2 })
        );
        assert_eq!(
            OverlayEvent::from_game_effect(&GameEffect::GameOver {
                final_score: 0,
                victory: false
            }),
            Some(OverlayEvent::GameOver { victory: false })
        );
        assert_eq!(OverlayEvent::from_game_effect(&GameEffect::Dive), None);
    }
}
