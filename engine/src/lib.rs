pub mod debounce;
pub mod persist;
pub mod poll;
pub mod serde_millis;
pub mod timer;

pub const DEFAULT_HISTORY_LIMIT: usize = 4_096;

/// Rewindable state history. Oldest frames are dropped once `limit` is reached so
/// long headless sessions stay bounded; frame numbers keep counting from the start.
#[derive(Debug)]
pub struct TimeMachine<State> {
    states: Vec<State>,
    cursor: usize,
    dropped: usize,
    limit: usize,
}

impl<State> TimeMachine<State> {
    pub fn new(initial_state: State) -> Self {
        Self::with_limit(initial_state, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(initial_state: State, limit: usize) -> Self {
        Self {
            states: vec![initial_state],
            cursor: 0,
            dropped: 0,
            limit: limit.max(1),
        }
    }

    pub fn frame(&self) -> usize {
        self.dropped + self.cursor
    }

    pub fn first_frame(&self) -> usize {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self) -> &State {
        &self.states[self.cursor]
    }

    pub fn state_at(&self, frame: usize) -> Option<&State> {
        frame
            .checked_sub(self.dropped)
            .and_then(|idx| self.states.get(idx))
    }

    pub fn history(&self) -> &[State] {
        &self.states
    }

    pub fn can_rewind(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_forward(&self) -> bool {
        self.cursor + 1 < self.states.len()
    }

    pub fn rewind(&mut self, frames: usize) -> usize {
        self.cursor = self.cursor.saturating_sub(frames);
        self.frame()
    }

    pub fn forward(&mut self, frames: usize) -> usize {
        let last = self.states.len().saturating_sub(1);
        self.cursor = (self.cursor + frames).min(last);
        self.frame()
    }

    /// Records `state` after the cursor, discarding any rewound-over branch.
    pub fn record(&mut self, state: State) -> usize {
        self.states.truncate(self.cursor + 1);
        self.states.push(state);
        self.cursor += 1;

        if self.states.len() > self.limit {
            let excess = self.states.len() - self.limit;
            self.states.drain(..excess);
            self.cursor -= excess;
            self.dropped += excess;
        }
        self.frame()
    }
}

pub trait GameLogic {
    type State;
    type Input;

    fn initial_state(&self) -> Self::State;
    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State;
}

#[derive(Debug)]
pub struct HeadlessRunner<G: GameLogic> {
    game: G,
    timemachine: TimeMachine<G::State>,
}

impl<G: GameLogic> HeadlessRunner<G> {
    pub fn new(game: G) -> Self {
        Self::with_history_limit(game, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(game: G, limit: usize) -> Self {
        let initial_state = game.initial_state();
        Self {
            game,
            timemachine: TimeMachine::with_limit(initial_state, limit),
        }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn frame(&self) -> usize {
        self.timemachine.frame()
    }

    pub fn state(&self) -> &G::State {
        self.timemachine.state()
    }

    pub fn timemachine(&self) -> &TimeMachine<G::State> {
        &self.timemachine
    }

    pub fn step(&mut self, input: G::Input) -> usize {
        let next_state = self.game.step(self.timemachine.state(), input);
        self.timemachine.record(next_state)
    }

    pub fn run<I>(&mut self, inputs: I) -> usize
    where
        I: IntoIterator<Item = G::Input>,
    {
        let mut last_frame = self.frame();
        for input in inputs {
            last_frame = self.step(input);
        }
        last_frame
    }

    /// Steps until `stop` returns true for the current state or `max_steps` inputs
    /// have been consumed. Returns the number of steps taken.
    pub fn run_until<F, S>(&mut self, max_steps: usize, mut next_input: F, mut stop: S) -> usize
    where
        F: FnMut(&G::State) -> G::Input,
        S: FnMut(&G::State) -> bool,
    {
        let mut steps = 0;
        while steps < max_steps && !stop(self.state()) {
            let input = next_input(self.state());
            self.step(input);
            steps += 1;
        }
        steps
    }

    pub fn rewind(&mut self, frames: usize) -> usize {
        self.timemachine.rewind(frames)
    }

    pub fn forward(&mut self, frames: usize) -> usize {
        self.timemachine.forward(frames)
    }

    pub fn reset(&mut self) {
        let limit = self.timemachine.limit;
        self.timemachine = TimeMachine::with_limit(self.game.initial_state(), limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Additive;

    impl GameLogic for Additive {
        type State = i32;
        type Input = i32;

        fn initial_state(&self) -> Self::State {
            0
        }

        fn step(&self, state: &Self::State, input: Self::Input) -> Self::State {
            *state + input
        }
    }

    #[test]
    fn timemachine_rewind_and_branch() {
        let mut tm = TimeMachine::new(0);
        tm.record(1);
        tm.record(2);
        assert_eq!(tm.state(), &2);

        tm.rewind(1);
        assert_eq!(tm.state(), &1);

        tm.record(99);
        assert_eq!(tm.history(), &[0, 1, 99]);
        assert_eq!(tm.frame(), 2);
    }

    #[test]
    fn timemachine_drops_oldest_frames_past_limit() {
        let mut tm = TimeMachine::with_limit(0, 3);
        for v in 1..=5 {
            tm.record(v);
        }
        assert_eq!(tm.history(), &[3, 4, 5]);
        assert_eq!(tm.frame(), 5);
        assert_eq!(tm.first_frame(), 3);
        assert_eq!(tm.state_at(4), Some(&4));
        assert_eq!(tm.state_at(1), None);

        tm.rewind(10);
        assert_eq!(tm.frame(), 3);
        assert_eq!(tm.state(), &3);
    }

    #[test]
    fn runner_steps_and_seeks() {
        let mut runner = HeadlessRunner::new(Additive);
        runner.run([1, 2, 3]);
        assert_eq!(runner.frame(), 3);
        assert_eq!(runner.state(), &6);

        runner.rewind(2);
        assert_eq!(runner.state(), &1);

        runner.forward(1);
        assert_eq!(runner.state(), &3);
    }

    #[test]
    fn run_until_stops_on_predicate_or_budget() {
        let mut runner = HeadlessRunner::new(Additive);
        let steps = runner.run_until(100, |_| 2, |s| *s >= 10);
        assert_eq!(steps, 5);
        assert_eq!(runner.state(), &10);

        runner.reset();
        let steps = runner.run_until(3, |_| 1, |_| false);
        assert_eq!(steps, 3);
        assert_eq!(runner.state(), &3);
    }
}
