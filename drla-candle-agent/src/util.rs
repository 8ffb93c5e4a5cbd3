//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use drla_core::{error::DrlaError, util::ensure_finite};
use log::trace;

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: usize);
}

fn check_tau(tau: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&tau) {
        return Err(DrlaError::InvalidConfig(format!("tau must be in [0, 1], got {}", tau)).into());
    }
    Ok(())
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    track_with_replace_substring(dest, src, tau, ("", ""))
}

/// Apply soft update on variables whose names differ by a substring.
///
/// The variable `k` in `dest` is paired with the variable in `src` whose
/// name is `k` with `ss_dest` replaced by `ss_src`.
pub fn track_with_replace_substring(
    dest: &VarMap,
    src: &VarMap,
    tau: f64,
    (ss_src, ss_dest): (&str, &str),
) -> Result<()> {
    check_tau(tau)?;
    trace!("track(tau = {})", tau);
    let dest = dest
        .data()
        .lock()
        .map_err(|_| anyhow!("Lock of the target variables is poisoned"))?;
    let src = src
        .data()
        .lock()
        .map_err(|_| anyhow!("Lock of the source variables is poisoned"))?;

    for (k_dest, v_dest) in dest.iter() {
        let k_src = match ss_dest.is_empty() {
            true => k_dest.clone(),
            false => k_dest.replace(ss_dest, ss_src),
        };
        let v_src = src
            .get(&k_src)
            .ok_or_else(|| anyhow!("Variable {} is not in the source", k_src))?;
        let t_dest = v_src
            .as_tensor()
            .affine(tau, 0.0)?
            .add(&v_dest.as_tensor().affine(1.0 - tau, 0.0)?)?;
        v_dest.set(&t_dest)?;
    }

    Ok(())
}

/// Converts a scalar tensor to `f32` and checks it is finite.
pub fn finite_scalar(name: &str, t: &Tensor) -> Result<f32> {
    let v = t.to_dtype(candle_core::DType::F32)?.to_scalar::<f32>()?;
    Ok(ensure_finite(name, v)?)
}

/// Checks that every variable in `varmap` holds finite values only.
pub fn ensure_finite_varmap(name: &str, varmap: &VarMap) -> Result<()> {
    let data = varmap
        .data()
        .lock()
        .map_err(|_| anyhow!("Lock of the variables is poisoned"))?;
    for (k, v) in data.iter() {
        let values = v
            .as_tensor()
            .flatten_all()?
            .to_dtype(candle_core::DType::F32)?
            .to_vec1::<f32>()?;
        if let Some(x) = values.iter().find(|x| !x.is_finite()) {
            return Err(
                DrlaError::NumericDivergence(format!("{} variable {} has {}", name, k, x)).into(),
            );
        }
    }
    Ok(())
}

/// Returns the mean of all elements as `f32`.
pub fn mean(t: &Tensor) -> Result<f32> {
    Ok(t.mean_all()?.to_scalar::<f32>()?)
}

/// Creates a tensor of shape `[data.len() / dim, dim]`.
pub fn matrix(data: &[f32], dim: usize, device: &Device) -> Result<Tensor> {
    Ok(Tensor::from_slice(data, (data.len() / dim, dim), device)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::Init;

    fn varmap(name: &str, v: &[f32]) -> Result<VarMap> {
        let vm = VarMap::new();
        vm.get(v.len(), name, Init::Const(0.0), DType::F32, &Device::Cpu)?;
        let t = Tensor::from_slice(v, (v.len(),), &Device::Cpu)?;
        vm.data()
            .lock()
            .unwrap()
            .get(name)
            .unwrap()
            .set(&t)?;
        Ok(vm)
    }

    fn values(vm: &VarMap, name: &str) -> Result<Vec<f32>> {
        let data = vm.data().lock().unwrap();
        Ok(data.get(name).unwrap().as_tensor().to_vec1::<f32>()?)
    }

    #[test]
    fn test_track() -> Result<()> {
        let src = varmap("var1", &[0.0])?;
        let dest = varmap("var1", &[10.0])?;
        track(&dest, &src, 0.1)?;
        assert!((values(&dest, "var1")?[0] - 9.0).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_track_extremes() -> Result<()> {
        let src = varmap("var1", &[1.0, 2.0, 3.0])?;

        let dest = varmap("var1", &[4.0, 5.0, 6.0])?;
        track(&dest, &src, 0.0)?;
        assert_eq!(values(&dest, "var1")?, vec![4.0, 5.0, 6.0]);

        track(&dest, &src, 1.0)?;
        assert_eq!(values(&dest, "var1")?, vec![1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_track_moves_toward_source() -> Result<()> {
        let src = varmap("var1", &[1.0, -3.0])?;
        let dest = varmap("var1", &[4.0, 5.0])?;
        let mut prev = values(&dest, "var1")?;
        for _ in 0..5 {
            track(&dest, &src, 0.3)?;
            let cur = values(&dest, "var1")?;
            assert!(cur[0] < prev[0] && cur[0] > 1.0);
            assert!(cur[1] < prev[1] && cur[1] > -3.0);
            prev = cur;
        }
        Ok(())
    }

    #[test]
    fn test_track_invalid_tau() -> Result<()> {
        let src = varmap("var1", &[0.0])?;
        let dest = varmap("var1", &[10.0])?;
        assert!(track(&dest, &src, 1.5).is_err());
        assert_eq!(values(&dest, "var1")?, vec![10.0]);
        Ok(())
    }

    #[test]
    fn test_ensure_finite_varmap() -> Result<()> {
        let vm = varmap("var1", &[1.0, -2.0])?;
        ensure_finite_varmap("critic", &vm)?;

        let vm = varmap("var1", &[1.0, f32::INFINITY])?;
        let err = ensure_finite_varmap("critic", &vm).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DrlaError>(),
            Some(DrlaError::NumericDivergence(_))
        ));
        Ok(())
    }

    #[test]
    fn test_track_with_replace_substring() -> Result<()> {
        let src = varmap("critic0.w", &[2.0])?;
        let dest = varmap("critic_tgt0.w", &[0.0])?;
        track_with_replace_substring(&dest, &src, 1.0, ("critic", "critic_tgt"))?;
        assert_eq!(values(&dest, "critic_tgt0.w")?, vec![2.0]);
        Ok(())
    }
}
