pub mod replaybuffer;
pub mod qnetwork;

use replaybuffer::{ReplayBuffer, Transition};
use qnetwork::QNetwork;
use crate::error::{Error, Result};
use rand::prelude::*;
use rand::rng;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub const STATE_SIZE: usize = 5;
pub const ACTION_SIZE: usize = 3;

const MEMORY_CAPACITY: usize = 2000;
const DISCOUNT_FACTOR: f32 = 0.95;
const INITIAL_EPSILON: f32 = 1.0;
const EPSILON_DECAY: f32 = 0.995;
const MIN_EPSILON: f32 = 0.01;
const LEARNING_RATE: f32 = 0.001;

/// Deep Q-learning agent: replay memory, value network and epsilon-greedy policy.
pub struct Agent {
    q_network: QNetwork,
    memory: ReplayBuffer,

    discount_factor: f32,
    epsilon: f32,
    epsilon_decay: f32,
    min_epsilon: f32,
    learning_rate: f32,

    state_size: usize,
    action_size: usize
}

impl Agent {
    pub fn new(state_size: usize, action_size: usize) -> Self {
        Self {
            q_network: QNetwork::new(state_size, action_size, LEARNING_RATE),
            memory: ReplayBuffer::new(MEMORY_CAPACITY),
            discount_factor: DISCOUNT_FACTOR,
            epsilon: INITIAL_EPSILON,
            epsilon_decay: EPSILON_DECAY,
            min_epsilon: MIN_EPSILON,
            learning_rate: LEARNING_RATE,
            state_size,
            action_size
        }
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    /// Back to full exploration, keeping weights and memory.
    pub fn reset_exploration(&mut self) {
        self.epsilon = INITIAL_EPSILON;
    }

    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }

    pub fn state_size(&self) -> usize {
        self.state_size
    }

    pub fn predict(&self, state: &[f32]) -> Result<Vec<f32>> {
        self.q_network.predict(state)
    }

    pub fn remember(&mut self, transition: Transition) {
        self.memory.push(transition);
    }

    // greedy action, first index wins ties
    pub fn get_action(&self, state: &[f32]) -> Result<usize> {
        let q_values = self.q_network.predict(state)?;
        Ok(argmax(&q_values))
    }

    /// Epsilon-greedy action. Reads epsilon, never changes it.
    pub fn act(&self, state: &[f32]) -> Result<usize> {
        let mut rng = rng();
        if rng.random::<f32>() < self.epsilon {
            Ok(rng.random_range(0..self.action_size))
        } else {
            self.get_action(state)
        }
    }

    /// One pass of experience replay over `batch_size` sampled transitions.
    ///
    /// Silently does nothing until the memory holds a full batch. Every
    /// sample gets its own gradient step toward a target that differs from
    /// the current prediction only at the action taken; epsilon decays once
    /// per call. Returns the mean loss of the batch when training happened.
    pub fn replay(&mut self, batch_size: usize) -> Result<Option<f32>> {
        let minibatch = match self.memory.sample(batch_size) {
            Ok(minibatch) => minibatch,
            Err(Error::InsufficientData { .. }) => return Ok(None),
            Err(err) => return Err(err),
        };

        let mut total_loss = 0.0;
        for transition in &minibatch {
            let mut target = transition.reward;
            if !transition.terminal {
                let next_q = self.q_network.predict(&transition.next_state)?;
                target += self.discount_factor * next_q.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            }

            let mut target_values = self.q_network.predict(&transition.state)?;
            let slot = target_values.get_mut(transition.action).ok_or(Error::UnknownAction(transition.action))?;
            *slot = target;

            total_loss += self.q_network.fit(&transition.state, &target_values)?;
        }

        if self.epsilon > self.min_epsilon {
            self.epsilon = (self.epsilon * self.epsilon_decay).max(self.min_epsilon);
        }

        Ok(Some(total_loss / minibatch.len().max(1) as f32))
    }

    /// Forgets everything: new network (optionally resized), empty memory, full exploration.
    pub fn reset(&mut self, new_state_size: Option<usize>, new_action_size: Option<usize>) {
        if let Some(state_size) = new_state_size {
            self.state_size = state_size;
        }
        if let Some(action_size) = new_action_size {
            self.action_size = action_size;
        }

        self.memory.clear();
        self.q_network = QNetwork::new(self.state_size, self.action_size, self.learning_rate);
        self.epsilon = INITIAL_EPSILON;
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new(STATE_SIZE, ACTION_SIZE)
    }
}

/// The one learner every connection and the training worker share.
///
/// `act` runs under the read lock; `remember`, `replay` and `reset` under the
/// write lock, so a decision can wait behind a training pass but never sees
/// half-updated weights.
///
/// The lock is a blocking `std::sync::RwLock` and the trainer holds it for a
/// whole replay, so async callers must take it from a blocking context
/// (`tokio::task::block_in_place` or `spawn_blocking`), never straight from
/// a runtime worker.
#[derive(Clone)]
pub struct SharedAgent(Arc<RwLock<Agent>>);

impl SharedAgent {
    pub fn new(agent: Agent) -> Self {
        Self(Arc::new(RwLock::new(agent)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Agent> {
        self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Agent> {
        self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn argmax(values: &[f32]) -> usize {
    values.iter().enumerate().fold((0, f32::NEG_INFINITY), |(best, best_value), (i, &value)| {
        if value > best_value { (i, value) } else { (best, best_value) }
    }).0
}
