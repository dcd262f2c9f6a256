use rand::Rng;

use crate::config::{DefenderProfile, DefensiveLook, PlayCall, TendencyTable};

/// Rushers show blitz; coverage players show a base look.
pub fn defensive_look(profile: &DefenderProfile) -> DefensiveLook {
    if profile.rush_moves.is_empty() {
        DefensiveLook::Base
    } else {
        DefensiveLook::Blitz
    }
}

pub fn select_play<R: Rng + ?Sized>(rng: &mut R, table: &TendencyTable) -> PlayCall {
    let Some(total) = table.total().filter(|&t| t > 0) else {
        return PlayCall::QuickPass;
    };
    let mut pick = rng.gen_range(0..total);
    for call in PlayCall::ALL {
        let weight = table.weight(call);
        if pick < weight {
            return call;
        }
        pick -= weight;
    }
    PlayCall::QuickPass
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::config::{DefenderArchetype, GameConfig};

    #[test]
    fn blitz_look_favors_quick_pass() {
        let config = GameConfig::default();
        let table = config.offense.table(DefensiveLook::Blitz);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let trials = 20_000;
        let quick = (0..trials)
            .filter(|_| select_play(&mut rng, table) == PlayCall::QuickPass)
            .count();
        let share = quick as f64 / trials as f64;
        assert!((share - 0.70).abs() < 0.02, "quick pass share {share}");
    }

    #[test]
    fn zero_weight_calls_are_never_selected() {
        let table = TendencyTable {
            quick_pass: 0,
            deep_pass: 5,
            screen: 0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..500 {
            assert_eq!(select_play(&mut rng, &table), PlayCall::DeepPass);
        }
    }

    #[test]
    fn rushers_show_blitz() {
        let config = GameConfig::default();
        assert_eq!(
            defensive_look(config.roster.profile(DefenderArchetype::DLine)),
            DefensiveLook::Blitz
        );
        assert_eq!(
            defensive_look(config.roster.profile(DefenderArchetype::DefensiveBack)),
            DefensiveLook::Base
        );
    }
}
