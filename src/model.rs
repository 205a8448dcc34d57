// 该文件是 Shouyu （手语） 项目的一部分。
// src/model.rs - 模型
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

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::{
  FromUrl,
  tensor::{EncodedTensor, TENSOR_SHAPE},
};

pub trait Model {
  type Input;
  type Output;
  type Error;

  /// 模型声明的输入形状
  fn input_shape(&self) -> &[usize];
  /// 模型声明的输出形状
  fn output_shape(&self) -> &[usize];

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

pub trait WithLabel: Sized + std::fmt::Debug {
  fn to_label_str(&self) -> &'static str;
  fn from_label_id(id: usize) -> Option<Self>;
}

/// 手势类别，顺序与模型输出下标一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureLabel {
  A,
  B,
  C,
  I,
  N,
}

impl GestureLabel {
  pub const ALL: [GestureLabel; 5] = [
    GestureLabel::A,
    GestureLabel::B,
    GestureLabel::C,
    GestureLabel::I,
    GestureLabel::N,
  ];
}

impl WithLabel for GestureLabel {
  fn to_label_str(&self) -> &'static str {
    match self {
      GestureLabel::A => "a",
      GestureLabel::B => "b",
      GestureLabel::C => "c",
      GestureLabel::I => "i",
      GestureLabel::N => "n",
    }
  }

  fn from_label_id(id: usize) -> Option<Self> {
    Self::ALL.get(id).copied()
  }
}

impl std::fmt::Display for GestureLabel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.to_label_str())
  }
}

/// 每个类别的置信度
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Confidences {
  scores: Box<[f32]>,
}

impl From<Vec<f32>> for Confidences {
  fn from(scores: Vec<f32>) -> Self {
    Self {
      scores: scores.into_boxed_slice(),
    }
  }
}

impl Confidences {
  pub fn as_slice(&self) -> &[f32] {
    &self.scores
  }

  pub fn len(&self) -> usize {
    self.scores.len()
  }

  pub fn is_empty(&self) -> bool {
    self.scores.is_empty()
  }

  /// 最大值的下标和数值，并列时取最小下标
  pub fn argmax(&self) -> Option<(usize, f32)> {
    let (&first, rest) = self.scores.split_first()?;
    let mut best = (0, first);
    for (i, &score) in rest.iter().enumerate() {
      if score > best.1 {
        best = (i + 1, score);
      }
    }
    Some(best)
  }
}

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("模型尚未初始化")]
  NotReady,
  #[error("模型已关闭")]
  Closed,
  #[error("模型形状不匹配: 期望 {expected:?}, 实际 {actual:?}")]
  ShapeMismatch {
    expected: Vec<usize>,
    actual: Vec<usize>,
  },
  #[error("模型输出为空")]
  EmptyOutput,
  #[cfg(feature = "model_onnx")]
  #[error("ONNX 模型错误: {0}")]
  OnnxModelError(#[from] OnnxModelError),
  #[error("回放模型错误: {0}")]
  ReplayModelError(#[from] ReplayModelError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// 检查模型声明的输入形状，允许前置大小为 1 的批次维度
pub fn check_input_shape(shape: &[usize]) -> Result<(), ModelError> {
  let matches = match shape {
    [frames, values] | [1, frames, values] => [*frames, *values] == TENSOR_SHAPE,
    _ => false,
  };

  if matches {
    Ok(())
  } else {
    Err(ModelError::ShapeMismatch {
      expected: TENSOR_SHAPE.to_vec(),
      actual: shape.to_vec(),
    })
  }
}

/// 输出必须是一个非空的置信度向量（可带批次维度 1）
pub fn check_output_shape(shape: &[usize]) -> Result<(), ModelError> {
  let matches = match shape {
    [classes] | [1, classes] => *classes > 0,
    _ => false,
  };

  if matches {
    Ok(())
  } else {
    Err(ModelError::ShapeMismatch {
      expected: vec![1, GestureLabel::ALL.len()],
      actual: shape.to_vec(),
    })
  }
}

mod slot;
pub use self::slot::ModelSlot;

mod replay;
pub use self::replay::{ReplayModel, ReplayModelError};

#[cfg(feature = "model_onnx")]
mod onnx;
#[cfg(feature = "model_onnx")]
pub use self::onnx::{OnnxModel, OnnxModelError};

/// 按 URI 方案选择的模型后端
pub enum ModelWrapper {
  #[cfg(feature = "model_onnx")]
  Onnx(OnnxModel),
  Replay(ReplayModel),
}

impl FromUrl for ModelWrapper {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    use crate::FromUrlWithScheme;

    match url.scheme() {
      #[cfg(feature = "model_onnx")]
      OnnxModel::SCHEME => Ok(ModelWrapper::Onnx(OnnxModel::from_url(url)?)),
      ReplayModel::SCHEME => Ok(ModelWrapper::Replay(ReplayModel::from_url(url)?)),
      _ => Err(ModelError::SchemeMismatch),
    }
  }
}

impl Model for ModelWrapper {
  type Input = EncodedTensor;
  type Output = Confidences;
  type Error = ModelError;

  fn input_shape(&self) -> &[usize] {
    match self {
      #[cfg(feature = "model_onnx")]
      ModelWrapper::Onnx(model) => model.input_shape(),
      ModelWrapper::Replay(model) => model.input_shape(),
    }
  }

  fn output_shape(&self) -> &[usize] {
    match self {
      #[cfg(feature = "model_onnx")]
      ModelWrapper::Onnx(model) => model.output_shape(),
      ModelWrapper::Replay(model) => model.output_shape(),
    }
  }

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    match self {
      #[cfg(feature = "model_onnx")]
      ModelWrapper::Onnx(model) => model.infer(input).map_err(ModelError::from),
      ModelWrapper::Replay(model) => model.infer(input).map_err(ModelError::from),
    }
  }
}
