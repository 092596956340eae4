use super::layer::{Layer, Dense};
use super::tensor::Tensor;

pub trait Optimizer: Send + Sync {
    fn step(&mut self, layers: &mut [Box<dyn Layer>]);
}


// Adam

const BETA_1: f32 = 0.9;
const BETA_2: f32 = 0.999;
const EPSILON: f32 = 1e-7;

// first and second moment estimates for one dense layer
struct Moments {
    m_weights: Tensor,
    v_weights: Tensor,
    m_biases: Tensor,
    v_biases: Tensor
}

impl Moments {
    fn for_layer(layer: &Dense) -> Self {
        Self {
            m_weights: Tensor::zeros(layer.weights.shape.clone()),
            v_weights: Tensor::zeros(layer.weights.shape.clone()),
            m_biases: Tensor::zeros(layer.biases.shape.clone()),
            v_biases: Tensor::zeros(layer.biases.shape.clone())
        }
    }
}

pub struct Adam {
    learning_rate: f32,
    timestep: i32,
    moments: Vec<Option<Moments>> // indexed like the layers
}

impl Adam {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            timestep: 0,
            moments: Vec::new()
        }
    }

    // returns (new_param, new_m, new_v)
    fn update(param: &Tensor, grad: &Tensor, m: &Tensor, v: &Tensor, step_size: f32) -> (Tensor, Tensor, Tensor) {
        let new_m = m.map2(grad, |m, g| BETA_1 * m + (1.0 - BETA_1) * g);
        let new_v = v.map2(grad, |v, g| BETA_2 * v + (1.0 - BETA_2) * g * g);
        let delta = new_m.map2(&new_v, move |m, v| step_size * m / (v.sqrt() + EPSILON));
        let new_param = param.map2(&delta, |p, d| p - d);
        (new_param, new_m, new_v)
    }
}

impl Optimizer for Adam {
    fn step(&mut self, layers: &mut [Box<dyn Layer>]) {
        self.timestep += 1;
        let step_size = self.learning_rate
            * (1.0 - BETA_2.powi(self.timestep)).sqrt()
            / (1.0 - BETA_1.powi(self.timestep));

        if self.moments.len() < layers.len() {
            self.moments.resize_with(layers.len(), || None);
        }

        for (layer, slot) in layers.iter_mut().zip(self.moments.iter_mut()) {
            let Some(dense_layer) = layer.as_any_mut().downcast_mut::<Dense>() else {
                continue;
            };
            let (Some(d_weights), Some(d_biases)) = (dense_layer.d_weights.take(), dense_layer.d_biases.take()) else {
                continue;
            };
            let moments = slot.get_or_insert_with(|| Moments::for_layer(dense_layer));

            let (weights, m_weights, v_weights) = Self::update(&dense_layer.weights, &d_weights, &moments.m_weights, &moments.v_weights, step_size);
            let (biases, m_biases, v_biases) = Self::update(&dense_layer.biases, &d_biases, &moments.m_biases, &moments.v_biases, step_size);

            dense_layer.weights = weights;
            dense_layer.biases = biases;
            *moments = Moments { m_weights, v_weights, m_biases, v_biases };
        }
    }
}
