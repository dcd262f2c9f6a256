use darkside::config::{DefenderArchetype, GameConfig};
use darkside::controller::{GameEffect, SessionSetup};
use darkside::phase::Phase;
use darkside::playtest::{Autopilot, AutopilotMode, DefenseLogic, SimInput};
use engine::HeadlessRunner;

fn logic(archetype: DefenderArchetype, seed: u64) -> DefenseLogic {
    DefenseLogic::new(
        GameConfig::default(),
        SessionSetup {
            week: 5,
            archetype,
            seed,
            high_score: 0,
        },
    )
}

#[test]
fn recorded_inputs_replay_to_the_same_state() {
    let mut live = HeadlessRunner::new(logic(DefenderArchetype::Linebacker, 21));
    let mut bot = Autopilot::new(AutopilotMode::Random { tap_chance: 0.1 }, 16, 21);
    let mut inputs = Vec::new();
    live.run_until(
        3_000,
        |s| {
            let input = bot.next_input(s);
            inputs.push(input);
            input
        },
        |s| s.controller.is_over(),
    );

    let mut replay = HeadlessRunner::new(logic(DefenderArchetype::Linebacker, 21));
    replay.run(inputs.iter().copied());

    assert_eq!(replay.frame(), live.frame());
    assert_eq!(replay.state().controller.stats(), live.state().controller.stats());
    assert_eq!(replay.state().controller.play(), live.state().controller.play());
}

#[test]
fn rewind_and_forward_walk_the_history() {
    let mut runner = HeadlessRunner::new(logic(DefenderArchetype::DefensiveBack, 1));
    runner.run(std::iter::repeat(SimInput::idle(100)).take(20));
    assert_eq!(runner.frame(), 20);
    // 1.2s pre-snap + 0.3s snap, then 0.5s into the play: no route releases that early.
    assert_eq!(runner.state().controller.phase(), Phase::Play);

    runner.rewind(20);
    assert_eq!(runner.frame(), 0);
    assert_eq!(runner.state().controller.phase(), Phase::PreSnap);

    runner.forward(12);
    assert_eq!(runner.state().controller.phase(), Phase::Snap);
    assert!(runner
        .state()
        .effects
        .iter()
        .any(|e| matches!(e, GameEffect::CameraShake { .. })));
}

#[test]
fn ideal_bot_outscores_an_idle_defender() {
    let play = |mode: Option<AutopilotMode>| {
        let mut runner = HeadlessRunner::with_history_limit(logic(DefenderArchetype::DLine, 9), 8);
        let mut bot = mode.map(|m| Autopilot::new(m, 16, 9));
        runner.run_until(
            400_000,
            |s| match bot.as_mut() {
                Some(bot) => bot.next_input(s),
                None => SimInput::idle(16),
            },
            |s| s.controller.is_over(),
        );
        assert!(runner.state().controller.is_over());
        *runner.state().controller.stats()
    };

    let idle = play(None);
    let ideal = play(Some(AutopilotMode::Ideal));
    assert_eq!(idle.sacks, 0);
    assert!(ideal.sacks > 0);
}
