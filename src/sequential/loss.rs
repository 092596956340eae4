use super::tensor::Tensor;

pub trait Loss: Send + Sync {
    fn calculate(&self, y_pred: &Tensor, y_true: &Tensor) -> f32;
    fn gradient(&self, y_pred: &Tensor, y_true: &Tensor) -> Tensor;
}


// mean squared error, averaged over every output of every sample

#[derive(Clone, Copy, Debug, Default)]
pub struct MeanSquaredError;

impl MeanSquaredError {
    fn element_count(y_pred: &Tensor) -> f32 {
        y_pred.shape.iter().product::<usize>().max(1) as f32
    }
}

impl Loss for MeanSquaredError {
    fn calculate(&self, y_pred: &Tensor, y_true: &Tensor) -> f32 {
        let squared_errors = y_pred.map2(y_true, |pred_x, true_x| (pred_x - true_x).powi(2));
        squared_errors.read().iter().sum::<f32>() / Self::element_count(y_pred)
    }

    fn gradient(&self, y_pred: &Tensor, y_true: &Tensor) -> Tensor {
        let n = Self::element_count(y_pred);
        y_pred.map2(y_true, move |pred_x, true_x| 2.0 * (pred_x - true_x) / n)
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
    fn test_mse_calculation() {
        let y_pred = Tensor::from_vec(vec![1.0, 2.0, 3.0], vec![1, 3]);
        let y_true = Tensor::from_vec(vec![1.0, 0.0, 6.0], vec![1, 3]);

        // (0 + 4 + 9) / 3
        let loss = MeanSquaredError.calculate(&y_pred, &y_true);
        assert!((loss - 13.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_mse_gradient_is_zero_where_target_matches() {
        let y_pred = Tensor::from_vec(vec![0.5, 2.0, -1.0], vec![1, 3]);
        let y_true = Tensor::from_vec(vec![0.5, 3.0, -1.0], vec![1, 3]);

        let gradient = MeanSquaredError.gradient(&y_pred, &y_true);

        // 2 * (2 - 3) / 3 on the one mismatched output only
        assert_vec_approx_eq(&gradient.read(), &[0.0, -2.0 / 3.0, 0.0]);
    }
}
