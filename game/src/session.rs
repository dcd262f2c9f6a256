//! Player-facing state that outlives a single session: name, leaderboard, high
//! score, campaign progress and the stats of the last finished session, written
//! through to a [`Persistence`] port on every mutation.

use std::collections::BTreeMap;

use engine::persist::{Persistence, load_versioned, save_versioned};
use serde::{Deserialize, Serialize};

use crate::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::scoring::SessionStats;

pub const SESSION_KEY: &str = "darkside-session";
pub const SESSION_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekProgress {
    pub qb_score: Option<u64>,
    pub defense_score: Option<u64>,
}

impl WeekProgress {
    pub fn is_complete(&self) -> bool {
        self.qb_score.is_some() && self.defense_score.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignProgress {
    pub current_week: u32,
    pub weeks: BTreeMap<u32, WeekProgress>,
}

impl Default for CampaignProgress {
    fn default() -> Self {
        Self {
            current_week: 1,
            weeks: BTreeMap::new(),
        }
    }
}

impl CampaignProgress {
    pub fn week(&self, week: u32) -> WeekProgress {
        self.weeks.get(&week).copied().unwrap_or_default()
    }

    fn record(&mut self, week: u32, update: impl FnOnce(&mut WeekProgress)) -> bool {
        let progress = self.weeks.entry(week).or_default();
        update(progress);
        if progress.is_complete() && week == self.current_week {
            self.current_week += 1;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    player_name: Option<String>,
    leaderboard: Leaderboard,
    high_score: u64,
    campaign: CampaignProgress,
    #[serde(default)]
    last_session: Option<FinishedSession>,
}

/// Stats of the most recent session, stored when it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedSession {
    pub week: u32,
    pub stats: SessionStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveSession {
    week: u32,
    stats: SessionStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub week: u32,
    pub final_score: u64,
    pub raw_score: i64,
    pub wave: u32,
    pub plays: u32,
    pub tackles: u32,
    pub sacks: u32,
    pub interceptions: u32,
    pub new_high_score: bool,
    pub qualifies_for_leaderboard: bool,
}

pub struct SessionStore<P: Persistence> {
    store: P,
    data: PersistedSession,
    active: Option<ActiveSession>,
}

impl<P: Persistence> SessionStore<P> {
    /// Loads persisted state; a missing, corrupt or outdated record starts empty.
    pub fn new(store: P) -> Self {
        let mut data: PersistedSession = load_versioned(&store, SESSION_KEY, SESSION_VERSION);
        data.leaderboard.normalize();
        data.campaign.current_week = data.campaign.current_week.max(1);
        Self {
            store,
            data,
            active: None,
        }
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn player_name(&self) -> Option<&str> {
        self.data.player_name.as_deref()
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.data.leaderboard
    }

    pub fn high_score(&self) -> u64 {
        self.data.high_score
    }

    pub fn campaign(&self) -> &CampaignProgress {
        &self.data.campaign
    }

    pub fn last_session(&self) -> Option<&FinishedSession> {
        self.data.last_session.as_ref()
    }

    pub fn current_stats(&self) -> Option<&SessionStats> {
        self.active.as_ref().map(|a| &a.stats)
    }

    pub fn current_score(&self) -> i64 {
        self.active.map_or(0, |a| a.stats.score)
    }

    pub fn current_wave(&self) -> u32 {
        self.active.map_or(1, |a| a.stats.wave)
    }

    pub fn is_session_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn add_leaderboard_entry(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let rank = self.data.leaderboard.insert(entry);
        self.persist();
        rank
    }

    pub fn set_player_name(&mut self, name: &str) {
        let name = name.trim();
        self.data.player_name = (!name.is_empty()).then(|| name.to_string());
        self.persist();
    }

    /// Starts tracking a session for `week`, replacing any session already running.
    /// Returns the stats the controller should start from.
    pub fn start_game_session(&mut self, week: u32) -> SessionStats {
        if let Some(prev) = self.active {
            log::warn!("starting week {week} over unfinished week {} session", prev.week);
        }
        let stats = SessionStats::new(self.data.high_score);
        self.active = Some(ActiveSession { week, stats });
        log::info!("session started for week {week}");
        stats
    }

    /// Mirrors the controller's running stats while a session is live.
    pub fn record_stats(&mut self, stats: SessionStats) {
        match &mut self.active {
            Some(active) => active.stats = stats,
            None => log::debug!("stats recorded with no active session"),
        }
    }

    pub fn end_game_session(&mut self, stats: SessionStats) -> GameSummary {
        let week = match self.active.take() {
            Some(active) => active.week,
            None => {
                log::debug!("ending a session that was never started");
                self.data.campaign.current_week
            }
        };

        let final_score = stats.final_score();
        let new_high_score = final_score > self.data.high_score;
        if new_high_score {
            self.data.high_score = final_score;
        }
        let summary = GameSummary {
            week,
            final_score,
            raw_score: stats.score,
            wave: stats.wave,
            plays: stats.plays,
            tackles: stats.tackles,
            sacks: stats.sacks,
            interceptions: stats.interceptions,
            new_high_score,
            qualifies_for_leaderboard: final_score > 0
                && self.data.leaderboard.qualifies(final_score),
        };
        self.data.last_session = Some(FinishedSession { week, stats });
        self.persist();
        log::info!(
            "session ended for week {week}: {final_score} points, wave {}",
            stats.wave
        );
        summary
    }

    /// Returns true if this completed the current week and advanced the campaign.
    pub fn complete_stage_qb(&mut self, week: u32, score: u64) -> bool {
        self.complete_stage(week, |p| {
            p.qb_score = Some(p.qb_score.map_or(score, |s| s.max(score)))
        })
    }

    pub fn complete_stage_defense(&mut self, week: u32, score: u64) -> bool {
        self.complete_stage(week, |p| {
            p.defense_score = Some(p.defense_score.map_or(score, |s| s.max(score)))
        })
    }

    fn complete_stage(&mut self, week: u32, update: impl FnOnce(&mut WeekProgress)) -> bool {
        let advanced = self.data.campaign.record(week, update);
        if advanced {
            log::info!(
                "week {week} complete, campaign at week {}",
                self.data.campaign.current_week
            );
        }
        self.persist();
        advanced
    }

    pub fn reset(&mut self) {
        self.data = PersistedSession::default();
        self.active = None;
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(err) =
            save_versioned(&mut self.store, SESSION_KEY, SESSION_VERSION, &self.data)
        {
            log::warn!("session write failed, keeping in-memory state: {err}");
        }
    }
}
