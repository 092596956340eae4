use std::sync::Arc;

use log::{debug, info};

use crate::agent::SharedAgent;
use crate::agent::replaybuffer::Transition;
use crate::error::Result;
use crate::observation::{GAME_OVER_REWARD, Observation, RewardShaper, TICK_REWARD};
use crate::scheduler::TrainingScheduler;
use crate::telemetry::{Action, Telemetry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingTelemetry,
    Active,
    GameOver,
}

/// What the connection loop should do after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to send.
    Ignored,
    /// Send this action.
    Act(Action),
    /// Episode ended: pause, send the restart command, then `restart_episode`.
    GameOver,
}

/// Per-connection episode bookkeeping between the game and the shared agent.
pub struct Session {
    agent: SharedAgent,
    scheduler: Arc<TrainingScheduler>,
    phase: Phase,
    prev_state: Option<Vec<f32>>,
    prev_action: Option<usize>,
    prev_score: f64,
    last_reward: f32,
    rewards: RewardShaper,
}

impl Session {
    pub fn new(agent: SharedAgent, scheduler: Arc<TrainingScheduler>) -> Self {
        Self {
            agent,
            scheduler,
            phase: Phase::AwaitingTelemetry,
            prev_state: None,
            prev_action: None,
            prev_score: 0.0,
            last_reward: 0.0,
            rewards: RewardShaper::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_reward(&self) -> f32 {
        self.last_reward
    }

    pub fn prev_score(&self) -> f64 {
        self.prev_score
    }

    /// Handles one raw message. Malformed or unrecognised payloads are
    /// skipped without touching any state; an error here means the agent
    /// itself rejected the state and the session cannot go on.
    pub fn on_message(&mut self, text: &str) -> Result<Outcome> {
        let telemetry = match Telemetry::parse(text) {
            Ok(Some(telemetry)) => telemetry,
            Ok(None) => {
                debug!("ignoring message without telemetry");
                return Ok(Outcome::Ignored);
            }
            Err(err) => {
                debug!("ignoring malformed telemetry: {}", err);
                return Ok(Outcome::Ignored);
            }
        };

        match telemetry {
            Telemetry::GameOver => Ok(self.on_game_over()),
            Telemetry::Frame(frame) => {
                let observation = Observation::from_frame(&frame);
                if let Some(score) = frame.score {
                    self.prev_score = score;
                }
                self.on_observation(observation).map(Outcome::Act)
            }
        }
    }

    fn on_game_over(&mut self) -> Outcome {
        // bookkeeping only: no transition carries this penalty
        self.last_reward = GAME_OVER_REWARD;
        self.phase = Phase::GameOver;
        info!("game over at score {}", self.prev_score);
        Outcome::GameOver
    }

    fn on_observation(&mut self, observation: Observation) -> Result<Action> {
        let Observation { nearest, state } = observation;
        debug!(
            "state: player bottom {}, player right {}, obstacle right {}, obstacle bottom {}, obstacle type {}",
            state[0], state[1], state[2], state[3], state[4]
        );

        let reward = self.rewards.reward(nearest.right);
        if reward > TICK_REWARD {
            info!("obstacle passed, reward {}", reward);
        }
        self.last_reward = reward;

        if let (Some(prev_state), Some(prev_action)) = (self.prev_state.take(), self.prev_action) {
            self.agent.write().remember(Transition {
                state: prev_state,
                action: prev_action,
                reward,
                next_state: state.clone(),
                terminal: false,
            });
        }

        self.scheduler.step();

        let action = self.agent.read().act(&state)?;
        let command = Action::from_index(action)?;

        self.prev_state = Some(state);
        self.prev_action = Some(action);
        self.phase = Phase::Active;
        Ok(command)
    }

    /// Clears the episode after the restart command went out and puts the
    /// agent back into full exploration.
    pub fn restart_episode(&mut self) {
        self.prev_state = None;
        self.prev_action = None;
        self.prev_score = 0.0;
        self.rewards.clear();
        self.agent.write().reset_exploration();
        self.phase = Phase::AwaitingTelemetry;
    }
}
