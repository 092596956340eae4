pub mod tensor;
pub mod layer;
pub mod loss;
pub mod optimizer;

use tensor::Tensor;
use layer::Layer;
use loss::Loss;
use optimizer::Optimizer;

pub struct Sequential {
    pub layers: Vec<Box<dyn Layer>>,
    pub loss: Box<dyn Loss>,
    pub optimizer: Box<dyn Optimizer>
}

impl Sequential {
    pub fn new(layers: Vec<Box<dyn Layer>>, loss: Box<dyn Loss>, optimizer: Box<dyn Optimizer>) -> Self {
        Self {
            layers,
            loss,
            optimizer
        }
    }

    pub fn predict(&self, input: &Tensor) -> Tensor {
        let mut output = input.clone();
        for layer in &self.layers {
            output = layer.infer(&output);
        }
        output
    }

    // one gradient step on the batch, returns the loss before the step
    pub fn train_on_batch(&mut self, x_batch: &Tensor, y_batch: &Tensor) -> f32 {
        let mut y_pred = x_batch.clone();
        for layer in &mut self.layers {
            y_pred = layer.forward(&y_pred);
        }

        let loss = self.loss.calculate(&y_pred, y_batch);
        let mut d_output = self.loss.gradient(&y_pred, y_batch);
        for layer in self.layers.iter_mut().rev() {
            d_output = layer.backward(&d_output);
        }
        self.optimizer.step(&mut self.layers);

        loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequential::layer::{Dense, ReLU};
    use crate::sequential::loss::MeanSquaredError;
    use crate::sequential::optimizer::Adam;

    fn tiny_model() -> Sequential {
        let mut dense_layer = Dense::new(2, 1);
        dense_layer.weights = Tensor::from_vec(vec![0.5, -0.5], vec![2, 1]);
        dense_layer.biases = Tensor::from_vec(vec![0.1], vec![1, 1]);

        Sequential::new(vec![Box::new(dense_layer)], Box::new(MeanSquaredError), Box::new(Adam::new(0.01)))
    }

    #[test]
    fn test_predict_is_pure() {
        let model = tiny_model();
        let x = Tensor::from_vec(vec![1.0, 2.0], vec![1, 2]);

        // 0.5 - 1.0 + 0.1
        let first = model.predict(&x).to_vec();
        let second = model.predict(&x).to_vec();

        assert!((first[0] + 0.4).abs() < 1e-6);
        assert_eq!(first, second);
    }

    #[test]
    fn test_train_on_batch() {
        let mut model = tiny_model();
        let initial_weights = model.layers[0].as_any().downcast_ref::<Dense>().unwrap().weights.to_vec();

        let x_batch = Tensor::from_vec(vec![1.0, 2.0], vec![1, 2]);
        let y_batch = Tensor::from_vec(vec![1.0], vec![1, 1]);

        let loss = model.train_on_batch(&x_batch, &y_batch);

        // (-0.4 - 1.0)^2
        assert!((loss - 1.96).abs() < 1e-5);
        let final_weights = model.layers[0].as_any().downcast_ref::<Dense>().unwrap().weights.to_vec();
        assert_ne!(initial_weights, final_weights, "weights did not update after a training step");
    }

    #[test]
    fn test_repeated_steps_reduce_loss() {
        let layers: Vec<Box<dyn Layer>> = vec![
            Box::new(Dense::new(2, 8)),
            Box::new(ReLU::new()),
            Box::new(Dense::new(8, 1))
        ];
        let mut model = Sequential::new(layers, Box::new(MeanSquaredError), Box::new(Adam::new(0.01)));

        let x = Tensor::from_vec(vec![1.0, 0.5, -0.5, 1.0], vec![2, 2]);
        let y = Tensor::from_vec(vec![2.0, -1.0], vec![2, 1]);

        let first_loss = model.train_on_batch(&x, &y);
        let mut last_loss = first_loss;
        for _ in 0..300 {
            last_loss = model.train_on_batch(&x, &y);
        }

        assert!(last_loss < first_loss, "loss went from {} to {}", first_loss, last_loss);
    }
}
