use super::{create_linear_layers, mlp_forward, MlpConfig};
use crate::model::{SubModel1, SubModel2};
use anyhow::Result;
use candle_core::{Device, Tensor, D};
use candle_nn::{Linear, VarBuilder};

/// Multilayer perceptron with ReLU activation function.
///
/// As a [`SubModel2`], it is a critic taking the concatenation of
/// observations and actions.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    layers: Vec<Linear>,
}

fn build(vb: VarBuilder, config: MlpConfig) -> Result<Mlp> {
    let device = vb.device().clone();
    let layers = create_linear_layers(
        "mlp",
        vb,
        config.in_dim,
        &config.units,
        Some(config.out_dim),
    )?;

    Ok(Mlp {
        config,
        device,
        layers,
    })
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let xs = xs.to_device(&self.device)?;
        mlp_forward(xs, &self.layers, self.config.activation_out)
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        build(vb, config)
    }
}

impl SubModel2 for Mlp {
    type Config = MlpConfig;
    type Input1 = Tensor;
    type Input2 = Tensor;
    type Output = Tensor;

    fn forward(&self, input1: &Self::Input1, input2: &Self::Input2) -> Result<Tensor> {
        let input1 = input1.to_device(&self.device)?;
        let input2 = input2.to_device(&self.device)?;
        let input = Tensor::cat(&[input1, input2], D::Minus1)?;
        mlp_forward(input, &self.layers, self.config.activation_out)
    }

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        build(vb, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_critic_output_shape() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = <Mlp as SubModel2>::build(vb, MlpConfig::new(4, vec![8, 8], 1, false))?;

        let obs = Tensor::zeros((5, 3), DType::F32, &Device::Cpu)?;
        let act = Tensor::zeros((5, 1), DType::F32, &Device::Cpu)?;
        let q = SubModel2::forward(&mlp, &obs, &act)?;
        assert_eq!(q.dims(), &[5, 1]);

        // 3 layers, weight and bias each.
        assert_eq!(varmap.all_vars().len(), 6);
        Ok(())
    }
}
