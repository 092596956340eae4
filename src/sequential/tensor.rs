use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rand_distr::{Uniform, Distribution};
use rayon::prelude::*;
use std::fmt;

// row-major storage, shared between clones until written through `write`
pub struct Tensor {
    pub data: Arc<RwLock<Vec<f32>>>,
    pub shape: Vec<usize>,
    pub strides: Vec<usize>
}

impl Tensor {
    pub fn zeros(shape: Vec<usize>) -> Self {
        let data: Vec<f32> = vec![0.0; shape.iter().product()];
        Self::from_vec(data, shape)
    }

    /// Glorot-uniform initialised `[fan_in, fan_out]` weight matrix.
    pub fn glorot_uniform(fan_in: usize, fan_out: usize) -> Self {
        let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
        let uniform = Uniform::new_inclusive(-limit, limit).expect("glorot limit is finite");
        let mut rng = rand::rng();
        let data: Vec<f32> = (0..fan_in * fan_out).map(|_| uniform.sample(&mut rng)).collect();
        Self::from_vec(data, vec![fan_in, fan_out])
    }

    pub fn from_vec(data: Vec<f32>, shape: Vec<usize>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
            strides: Tensor::calc_strides(&shape),
            shape
        }
    }

    // single-row batch, the shape the network expects for one state
    pub fn row(values: &[f32]) -> Self {
        Self::from_vec(values.to_vec(), vec![1, values.len()])
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Vec<f32>> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<f32>> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.read().clone()
    }

    pub fn transpose(&self) -> Self {
        let mut new_shape = self.shape.clone();
        new_shape.reverse();
        let mut new_strides = self.strides.clone();
        new_strides.reverse();

        Self {
            data: Arc::clone(&self.data),
            shape: new_shape,
            strides: new_strides
        }
    }

    pub fn matmul(&self, other: &Tensor) -> Tensor {
        assert_eq!(self.shape.len(), 2, "self must be a 2D tensor.");
        assert_eq!(other.shape.len(), 2, "other must be a 2D tensor.");
        assert_eq!(self.shape[1], other.shape[0], "self columns must equal other rows");

        let k = self.shape[1];
        let n = other.shape[1];

        let c = Tensor::zeros(vec![self.shape[0], n]);

        let a_data = self.read();
        let b_data = other.read();

        {
            let mut c_data_guard = c.write();
            let c_slice: &mut [f32] = &mut c_data_guard;

            c_slice.par_chunks_mut(n).enumerate().for_each(|(m_idx, c_row)| {
                for k_idx in 0..k {
                    let a_val = a_data[m_idx * self.strides[0] + k_idx * self.strides[1]];
                    for n_idx in 0..n {
                        let b_val = b_data[k_idx * other.strides[0] + n_idx * other.strides[1]];
                        c_row[n_idx] += a_val * b_val;
                    }
                }
            });
        }

        c
    }

    // adds a [1, n] row to every row of an [m, n] tensor
    pub fn add_row(&self, row: &Tensor) -> Tensor {
        assert_eq!(self.shape.len(), 2, "add_row only works for 2D tensors");
        assert_eq!(row.shape, vec![1, self.shape[1]], "row must be [1, columns]");

        let n = self.shape[1];
        let output = self.contiguous();
        {
            let mut output_data = output.write();
            let row_data = row.read();
            output_data.par_chunks_mut(n).for_each(|out_row| {
                for (value, bias) in out_row.iter_mut().zip(row_data.iter()) {
                    *value += bias;
                }
            });
        }
        output
    }

    // column sums of a 2D tensor, as a [1, n] row
    pub fn sum_rows(&self) -> Tensor {
        assert_eq!(self.shape.len(), 2, "sum_rows only works for 2D tensors");

        let n = self.shape[1];
        let data = self.contiguous().to_vec();
        let totals = data.par_chunks(n).map(|row_slice| {
            row_slice.to_vec()
        }).reduce(
            || vec![0.0; n],
            |mut acc, row| {
                for i in 0..n {
                    acc[i] += row[i];
                }
                acc
            }
        );

        Tensor::from_vec(totals, vec![1, n])
    }

    pub fn map<F>(&self, f: F) -> Tensor
    where F: Fn(f32) -> f32 + Sync + Send {
        let input_data = self.read();
        let new_data: Vec<f32> = input_data.par_iter().map(|&x| f(x)).collect();
        Tensor::from_vec(new_data, self.shape.clone())
    }

    // elementwise over two tensors of equal shape
    pub fn map2<F>(&self, other: &Tensor, f: F) -> Tensor
    where F: Fn(f32, f32) -> f32 + Sync + Send {
        assert_eq!(self.shape, other.shape, "tensors must have the same shape");

        let data1 = self.read();
        let data2 = other.read();
        let new_data: Vec<f32> = data1.par_iter().zip(data2.par_iter()).map(|(&x1, &x2)| f(x1, x2)).collect();
        Tensor::from_vec(new_data, self.shape.clone())
    }

    // materialises a transposed view into fresh row-major storage
    fn contiguous(&self) -> Tensor {
        if self.strides == Tensor::calc_strides(&self.shape) {
            return Tensor::from_vec(self.to_vec(), self.shape.clone());
        }

        let (m, n) = (self.shape[0], self.shape[1]);
        let data = self.read();
        let mut out = Vec::with_capacity(m * n);
        for i in 0..m {
            for j in 0..n {
                out.push(data[i * self.strides[0] + j * self.strides[1]]);
            }
        }
        Tensor::from_vec(out, self.shape.clone())
    }

    fn calc_strides(shape: &[usize]) -> Vec<usize> {
        let mut strides: Vec<usize> = vec![1; shape.len()];
        for i in (0..strides.len().saturating_sub(1)).rev() {
            strides[i] = strides[i+1] * shape[i+1];
        }
        strides
    }
}

impl Clone for Tensor {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            shape: self.shape.clone(),
            strides: self.strides.clone()
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
         .field("shape", &self.shape)
         .field("data", &*self.read())
         .finish()
    }
}
