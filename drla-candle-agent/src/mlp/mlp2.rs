use super::{create_linear_layers, mlp_forward, MlpConfig};
use crate::model::SubModel1;
use anyhow::Result;
use candle_core::{Device, Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

/// Multilayer perceptron that outputs two tensors of the same size.
///
/// Used as a Gaussian policy, the outputs are the mean and the
/// log standard deviation.
pub struct Mlp2 {
    _config: MlpConfig,
    device: Device,
    head1: Linear,
    head2: Linear,
    layers: Vec<Linear>,
}

impl SubModel1 for Mlp2 {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = (Tensor, Tensor);

    fn forward(&self, xs: &Self::Input) -> Result<Self::Output> {
        let xs = xs.to_device(&self.device)?;
        let xs = mlp_forward(xs, &self.layers, true)?;
        let mean = self.head1.forward(&xs)?;
        let log_std = self.head2.forward(&xs)?;
        Ok((mean, log_std))
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vb.device().clone();
        let layers = create_linear_layers("mlp", vb.clone(), config.in_dim, &config.units, None)?;
        let in_dim = *config.units.last().unwrap_or(&config.in_dim);
        let head1 = linear(in_dim, config.out_dim, vb.pp("mean"))?;
        let head2 = linear(in_dim, config.out_dim, vb.pp("log_std"))?;

        Ok(Self {
            _config: config,
            device,
            head1,
            head2,
            layers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_two_heads() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = Mlp2::build(vb, MlpConfig::new(3, vec![16], 2, false))?;

        let obs = Tensor::ones((4, 3), DType::F32, &Device::Cpu)?;
        let (mean, log_std) = mlp.forward(&obs)?;
        assert_eq!(mean.dims(), &[4, 2]);
        assert_eq!(log_std.dims(), &[4, 2]);
        Ok(())
    }
}
