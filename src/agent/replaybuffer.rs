use crate::error::{Error, Result};

use std::collections::VecDeque;

/// One (state, action, reward, next_state, terminal) learning sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Vec<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Vec<f32>,
    pub terminal: bool
}

// FIFO: the oldest transition is dropped once capacity is reached
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity
        }
    }

    pub fn push(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    /// Draws `batch_size` distinct transitions uniformly at random.
    pub fn sample(&self, batch_size: usize) -> Result<Vec<&Transition>> {
        if self.buffer.len() < batch_size {
            return Err(Error::InsufficientData { requested: batch_size, stored: self.buffer.len() });
        }

        let indices = rand::seq::index::sample(&mut rand::rng(), self.buffer.len(), batch_size);
        Ok(indices.iter().map(|index| &self.buffer[index]).collect())
    }
}
