// 该文件是 Shouyu （手语） 项目的一部分。
// src/model/onnx.rs - ONNX 手势分类模型
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::Path;

use thiserror::Error;
use tracing::{debug, error, info};
use tract_onnx::prelude::{
  Framework, Graph, InferenceModelExt, SimplePlan, Tensor, TypedFact, TypedOp, tvec,
};
use tract_onnx::tract_hir::internal::DimLike;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{Confidences, Model},
  tensor::EncodedTensor,
};

#[derive(Error, Debug)]
pub enum OnnxModelError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("模型文件必须以 .onnx 结尾: {0}")]
  InvalidExtension(String),
  #[error("模型第 {0} 维不是固定大小")]
  SymbolicShape(usize),
  #[error("模型没有输出")]
  MissingOutput,
  #[error("tract 错误: {0}")]
  TractError(anyhow::Error),
}

impl From<anyhow::Error> for OnnxModelError {
  fn from(err: anyhow::Error) -> Self {
    OnnxModelError::TractError(err)
  }
}

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// 经 tract 优化后的常驻模型，加载一次后重复使用
pub struct OnnxModel {
  plan: Plan,
  input_shape: Vec<usize>,
  output_shape: Vec<usize>,
}

impl FromUrlWithScheme for OnnxModel {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for OnnxModel {
  type Error = OnnxModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(OnnxModelError::SchemeMismatch(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    Self::load(url.path())
  }
}

/// 将声明的形状转为具体大小，首维为符号时视作批次 1
fn concrete_shape(fact: &TypedFact) -> Result<Vec<usize>, OnnxModelError> {
  let dims: Vec<Option<usize>> = fact.shape.iter().map(|dim| dim.to_usize().ok()).collect();
  resolve_dims(&dims)
}

fn resolve_dims(dims: &[Option<usize>]) -> Result<Vec<usize>, OnnxModelError> {
  let rank = dims.len();
  dims
    .iter()
    .enumerate()
    .map(|(axis, dim)| match *dim {
      Some(size) => Ok(size),
      None if axis == 0 && rank >= 2 => Ok(1),
      None => Err(OnnxModelError::SymbolicShape(axis)),
    })
    .collect()
}

impl OnnxModel {
  pub fn load(path: impl AsRef<Path>) -> Result<Self, OnnxModelError> {
    let path = path.as_ref();
    match path.extension() {
      Some(ext) if ext == "onnx" => {}
      _ => return Err(OnnxModelError::InvalidExtension(path.display().to_string())),
    }

    info!("加载模型文件: {}", path.display());
    let model = tract_onnx::onnx().model_for_path(path)?.into_optimized()?;

    let input_shape = concrete_shape(model.input_fact(0)?)?;
    let output_shape = concrete_shape(model.output_fact(0)?)?;
    debug!("模型输入形状: {:?}", input_shape);
    debug!("模型输出形状: {:?}", output_shape);

    let plan = model.into_runnable()?;
    info!("模型加载完成");

    Ok(Self {
      plan,
      input_shape,
      output_shape,
    })
  }
}

impl Model for OnnxModel {
  type Input = EncodedTensor;
  type Output = Confidences;
  type Error = OnnxModelError;

  fn input_shape(&self) -> &[usize] {
    &self.input_shape
  }

  fn output_shape(&self) -> &[usize] {
    &self.output_shape
  }

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("设置模型输入");
    let tensor = Tensor::from_shape(&self.input_shape, input.as_slice())?;

    debug!("执行模型推理");
    let outputs = self.plan.run(tvec!(tensor.into()))?;

    let output = outputs.first().ok_or_else(|| {
      error!("模型推理没有返回输出");
      OnnxModelError::MissingOutput
    })?;
    let scores: Vec<f32> = output.to_array_view::<f32>()?.iter().copied().collect();
    debug!("模型推理结果: {:?}", scores);

    Ok(Confidences::from(scores))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    frame::{Landmark, LandmarkFrame},
    model::{GestureLabel, WithLabel},
    tensor::encode,
    window::SequenceWindow,
  };
  use approx::assert_relative_eq;
  use tract_onnx::prelude::DatumType;

  /// `[N, 10, 126] -> Flatten -> MatMul -> [N, 5]`，输出为编码张量的前 5 个值
  const FIRST5: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/first5.onnx");

  #[test]
  fn symbolic_batch_axis_resolves_to_one() {
    assert_eq!(
      resolve_dims(&[None, Some(5)]).unwrap(),
      vec![1, 5]
    );
    assert_eq!(
      resolve_dims(&[None, Some(10), Some(126)]).unwrap(),
      vec![1, 10, 126]
    );
  }

  #[test]
  fn other_symbolic_axes_are_rejected() {
    assert!(matches!(
      resolve_dims(&[None]),
      Err(OnnxModelError::SymbolicShape(0))
    ));
    assert!(matches!(
      resolve_dims(&[Some(1), None, Some(126)]),
      Err(OnnxModelError::SymbolicShape(1))
    ));
  }

  #[test]
  fn concrete_fact_keeps_its_shape() {
    let fact = TypedFact::dt_shape(DatumType::F32, [1usize, 10, 126]);
    assert_eq!(concrete_shape(&fact).unwrap(), vec![1, 10, 126]);
  }

  #[test]
  fn loads_and_runs_model_with_symbolic_batch() {
    let model = OnnxModel::load(FIRST5).unwrap();
    assert_eq!(model.input_shape(), &[1, 10, 126]);
    assert_eq!(model.output_shape(), &[1, 5]);

    let mut landmarks = vec![Landmark::default(); 21];
    landmarks[0] = Landmark::new(0.9, 0.1, 0.0);
    landmarks[1] = Landmark::new(0.2, 0.05, 0.0);
    let mut window = SequenceWindow::new();
    window.append(LandmarkFrame::from(landmarks)).unwrap();

    let scores = model.infer(&encode(&window)).unwrap();
    assert_eq!(scores.len(), 5);
    for (got, want) in scores.as_slice().iter().zip([0.9f32, 0.1, 0.0, 0.2, 0.05]) {
      assert_relative_eq!(*got, want, epsilon = 1e-6);
    }
    let (index, _) = scores.argmax().unwrap();
    assert_eq!(GestureLabel::from_label_id(index), Some(GestureLabel::A));
  }

  #[test]
  fn requires_onnx_extension() {
    assert!(matches!(
      OnnxModel::load("/tmp/model.tflite"),
      Err(OnnxModelError::InvalidExtension(_))
    ));
  }

  #[test]
  fn wrong_scheme_is_rejected() {
    let url = Url::parse("replay:///tmp/model.onnx").unwrap();
    assert!(matches!(
      OnnxModel::from_url(&url),
      Err(OnnxModelError::SchemeMismatch(_))
    ));
  }

  #[test]
  fn missing_file_is_an_error() {
    let url = Url::parse("onnx:///nonexistent/shouyu/model.onnx").unwrap();
    assert!(matches!(
      OnnxModel::from_url(&url),
      Err(OnnxModelError::TractError(_))
    ));
  }
}
