use super::tensor::Tensor;
use std::any::Any;

pub trait Layer: Send + Sync {
    // training pass, caches what `backward` needs
    fn forward(&mut self, input: &Tensor) -> Tensor;
    // inference pass, leaves the layer untouched
    fn infer(&self, input: &Tensor) -> Tensor;
    fn backward(&mut self, d_output: &Tensor) -> Tensor;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn as_any(&self) -> &dyn Any;
}


// dense layer

#[derive(Clone)]
pub struct Dense {
    pub weights: Tensor,
    pub biases: Tensor,
    cached_input: Option<Tensor>, // for back propagation
    pub d_weights: Option<Tensor>,
    pub d_biases: Option<Tensor>
}

impl Dense {
    pub fn new(input_size: usize, output_size: usize) -> Self {
        Self {
            weights: Tensor::glorot_uniform(input_size, output_size),
            biases: Tensor::zeros(vec![1, output_size]),
            cached_input: None,
            d_weights: None,
            d_biases: None
        }
    }
}

impl Layer for Dense {
    fn forward(&mut self, input: &Tensor) -> Tensor {
        self.cached_input = Some(input.clone());
        self.infer(input)
    }

    fn infer(&self, input: &Tensor) -> Tensor {
        input.matmul(&self.weights).add_row(&self.biases)
    }

    fn backward(&mut self, d_output: &Tensor) -> Tensor {
        let cached_input = self.cached_input.as_ref().expect("complete forward pass first.");

        // dL/dW = input.T @ dL/dY
        self.d_weights = Some(cached_input.transpose().matmul(d_output));

        // dL/db = dL/dY summed over the batch
        self.d_biases = Some(d_output.sum_rows());

        // dL/dX = dL/dY @ weights.T
        d_output.matmul(&self.weights.transpose())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}


// relu layer

#[derive(Clone, Default)]
pub struct ReLU {
    cached_input: Option<Tensor>
}

impl ReLU {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Layer for ReLU {
    fn forward(&mut self, input: &Tensor) -> Tensor {
        self.cached_input = Some(input.clone());
        self.infer(input)
    }

    fn infer(&self, input: &Tensor) -> Tensor {
        input.map(|x| x.max(0.0))
    }

    fn backward(&mut self, d_output: &Tensor) -> Tensor {
        let cached_input = self.cached_input.as_ref().expect("complete forward pass first.");
        cached_input.map2(d_output, |input_val, output_val| {
            if input_val > 0.0 {
                output_val
            } else {
                0.0
            }
        })
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_approx_eq(a: &[f32], b: &[f32]) {
        let tolerance = 1e-6;
        assert_eq!(a.len(), b.len(), "vectors have different lengths");
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < tolerance, "mismatch at index {}: {} vs {}", i, x, y);
        }
    }

    #[test]
    fn test_dense_forward() {
        let input = Tensor::from_vec(vec![1.0, 2.0], vec![1, 2]);
        let mut layer = Dense::new(2, 2);

        layer.weights = Tensor::from_vec(vec![10.0, 20.0, 30.0, 40.0], vec![2, 2]);
        layer.biases = Tensor::from_vec(vec![1.0, 2.0], vec![1, 2]);

        // [1, 2] @ [[10, 20], [30, 40]] + [1, 2] = [71, 102]
        let output = layer.forward(&input);

        assert_eq!(output.shape, vec![1, 2]);
        assert_vec_approx_eq(&output.read(), &[71.0, 102.0]);
    }

    #[test]
    fn test_dense_infer_matches_forward_without_caching() {
        let input = Tensor::from_vec(vec![0.5, -1.5, 2.0], vec![1, 3]);
        let mut layer = Dense::new(3, 4);

        let inferred = layer.infer(&input);
        assert!(layer.cached_input.is_none());

        let forwarded = layer.forward(&input);
        assert_vec_approx_eq(&inferred.read(), &forwarded.read());
    }

    #[test]
    fn test_dense_backward() {
        let input = Tensor::from_vec(vec![1.0, 2.0], vec![1, 2]);
        let d_output = Tensor::from_vec(vec![5.0, 8.0], vec![1, 2]);
        let mut layer = Dense::new(2, 2);
        layer.weights = Tensor::from_vec(vec![10.0, 20.0, 30.0, 40.0], vec![2, 2]);

        layer.forward(&input);

        // [5, 8] @ [[10, 30], [20, 40]] = [210, 470]
        let d_input = layer.backward(&d_output);
        assert_vec_approx_eq(&d_input.read(), &[210.0, 470.0]);

        // [[1], [2]] @ [[5, 8]]
        assert_vec_approx_eq(&layer.d_weights.unwrap().read(), &[5.0, 8.0, 10.0, 16.0]);
        assert_vec_approx_eq(&layer.d_biases.unwrap().read(), &[5.0, 8.0]);
    }

    #[test]
    fn test_relu_forward() {
        let input = Tensor::from_vec(vec![-10.0, -0.5, 0.0, 0.5, 10.0], vec![1, 5]);
        let mut layer = ReLU::new();
        let output = layer.forward(&input);
        assert_vec_approx_eq(&output.read(), &[0.0, 0.0, 0.0, 0.5, 10.0]);
    }

    #[test]
    fn test_relu_backward() {
        let input = Tensor::from_vec(vec![-10.0, -0.5, 0.0, 0.5, 10.0], vec![1, 5]);
        let d_output = Tensor::from_vec(vec![1.0; 5], vec![1, 5]);
        let mut layer = ReLU::new();

        layer.forward(&input);
        let d_input = layer.backward(&d_output);

        assert_vec_approx_eq(&d_input.read(), &[0.0, 0.0, 0.0, 1.0, 1.0]);
    }
}
