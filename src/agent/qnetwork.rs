use crate::error::{Error, Result};
use crate::sequential::{
    tensor::Tensor,
    layer::Layer,
    layer::Dense,
    layer::ReLU,
    loss::MeanSquaredError,
    optimizer::Adam,
    Sequential
};

const HIDDEN_SIZE: usize = 24;

/// Action-value approximator: state in, one value estimate per action out.
///
/// Two ReLU hidden layers of 24 units and a linear head, trained with MSE
/// under Adam. States are boxed into a single-row batch before every pass.
pub struct QNetwork {
    model: Sequential,
    state_size: usize,
    action_size: usize
}

impl QNetwork {
    pub fn new(state_size: usize, action_size: usize, learning_rate: f32) -> Self {
        let layers: Vec<Box<dyn Layer>> = vec![
            Box::new(Dense::new(state_size, HIDDEN_SIZE)),
            Box::new(ReLU::new()),
            Box::new(Dense::new(HIDDEN_SIZE, HIDDEN_SIZE)),
            Box::new(ReLU::new()),
            Box::new(Dense::new(HIDDEN_SIZE, action_size))
        ];
        let loss = Box::new(MeanSquaredError);
        let optimizer = Box::new(Adam::new(learning_rate));

        Self {
            model: Sequential::new(layers, loss, optimizer),
            state_size,
            action_size
        }
    }

    pub fn predict(&self, state: &[f32]) -> Result<Vec<f32>> {
        self.check_state(state)?;
        Ok(self.model.predict(&Tensor::row(state)).to_vec())
    }

    /// One gradient step pulling `predict(state)` toward `target`; returns the loss.
    pub fn fit(&mut self, state: &[f32], target: &[f32]) -> Result<f32> {
        self.check_state(state)?;
        if target.len() != self.action_size {
            return Err(Error::TargetSize { expected: self.action_size, actual: target.len() });
        }
        Ok(self.model.train_on_batch(&Tensor::row(state), &Tensor::row(target)))
    }

    fn check_state(&self, state: &[f32]) -> Result<()> {
        if state.len() != self.state_size {
            return Err(Error::StateSize { expected: self.state_size, actual: state.len() });
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn output_layer_mut(&mut self) -> &mut Dense {
        self.model.layers.last_mut()
            .and_then(|layer| layer.as_any_mut().downcast_mut::<Dense>())
            .unwrap()
    }
}
