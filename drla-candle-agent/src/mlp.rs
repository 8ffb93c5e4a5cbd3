//! Multilayer perceptron.
mod base;
mod config;
mod mlp2;
use anyhow::Result;
pub use base::Mlp;
use candle_core::Tensor;
use candle_nn::{linear, Linear, Module, VarBuilder};
pub use config::MlpConfig;
pub use mlp2::Mlp2;

/// Returns linear layers `in_dim -> units[0] -> ... -> units[n-1]`,
/// followed by `units[n-1] -> out_dim` if `out_dim` is given.
fn create_linear_layers(
    prefix: &str,
    vb: VarBuilder,
    in_dim: usize,
    units: &[usize],
    out_dim: Option<usize>,
) -> Result<Vec<Linear>> {
    let mut dims = vec![in_dim];
    dims.extend_from_slice(units);
    if let Some(out_dim) = out_dim {
        dims.push(out_dim);
    }
    let vb = vb.pp(prefix);

    dims.windows(2)
        .enumerate()
        .map(|(i, w)| Ok(linear(w[0], w[1], vb.pp(format!("ln{}", i)))?))
        .collect()
}

/// Applies the layers with ReLU between them.
///
/// ReLU is applied after the last layer only if `activation_out` is `true`.
fn mlp_forward(xs: Tensor, layers: &[Linear], activation_out: bool) -> Result<Tensor> {
    let n_layers = layers.len();
    let mut xs = xs;

    for (i, layer) in layers.iter().enumerate() {
        xs = layer.forward(&xs)?;
        if i + 1 < n_layers || activation_out {
            xs = xs.relu()?;
        }
    }

    Ok(xs)
}
