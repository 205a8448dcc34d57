// 该文件是 Shouyu （手语） 项目的一部分。
// src/model/replay.rs - 回放模型
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

use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{Confidences, Model},
  tensor::{EncodedTensor, TENSOR_SHAPE},
};

#[derive(Error, Debug)]
pub enum ReplayModelError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("脚本解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("回放脚本为空")]
  EmptyScript,
  #[error("第 {index} 条输出宽度为 {actual}, 与第一条的 {expected} 不一致")]
  RaggedScript {
    index: usize,
    expected: usize,
    actual: usize,
  },
  #[error("第 {0} 次推理按脚本失败")]
  ScriptedFailure(usize),
}

/// 按顺序循环返回预先录制的置信度向量，`null` 表示该次推理失败
pub struct ReplayModel {
  script: Box<[Option<Box<[f32]>>]>,
  cursor: AtomicUsize,
  input_shape: Vec<usize>,
  output_shape: Vec<usize>,
}

impl FromUrlWithScheme for ReplayModel {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayModel {
  type Error = ReplayModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayModelError::SchemeMismatch(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    info!("加载回放脚本: {}", url.path());
    let data = std::fs::read_to_string(url.path())?;
    let script: Vec<Option<Vec<f32>>> = serde_json::from_str(&data)?;
    Self::new(script)
  }
}

impl ReplayModel {
  pub fn new(script: Vec<Option<Vec<f32>>>) -> Result<Self, ReplayModelError> {
    let mut width = None;
    for (index, scores) in script.iter().enumerate() {
      let Some(scores) = scores else { continue };
      match width {
        None => width = Some(scores.len()),
        Some(expected) if expected != scores.len() => {
          return Err(ReplayModelError::RaggedScript {
            index,
            expected,
            actual: scores.len(),
          });
        }
        Some(_) => {}
      }
    }

    if script.is_empty() {
      return Err(ReplayModelError::EmptyScript);
    }

    debug!("回放脚本共 {} 条", script.len());
    Ok(Self {
      script: script
        .into_iter()
        .map(|s| s.map(Vec::into_boxed_slice))
        .collect(),
      cursor: AtomicUsize::new(0),
      input_shape: TENSOR_SHAPE.to_vec(),
      output_shape: vec![1, width.unwrap_or(0)],
    })
  }

  /// 覆盖声明的输入形状
  pub fn with_input_shape(mut self, shape: Vec<usize>) -> Self {
    self.input_shape = shape;
    self
  }

  /// 已经执行的推理次数
  pub fn calls(&self) -> usize {
    self.cursor.load(Ordering::Relaxed)
  }
}

impl Model for ReplayModel {
  type Input = EncodedTensor;
  type Output = Confidences;
  type Error = ReplayModelError;

  fn input_shape(&self) -> &[usize] {
    &self.input_shape
  }

  fn output_shape(&self) -> &[usize] {
    &self.output_shape
  }

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let call = self.cursor.fetch_add(1, Ordering::Relaxed);
    match &self.script[call % self.script.len()] {
      Some(scores) => Ok(Confidences::from(scores.to_vec())),
      None => Err(ReplayModelError::ScriptedFailure(call)),
    }
  }
}
