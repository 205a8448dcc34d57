// 该文件是 Shouyu （手语） 项目的一部分。
// src/classifier.rs - 手势分类适配器
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

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
  frame::{FrameError, LandmarkFrame},
  model::{Confidences, GestureLabel, Model, ModelError, ModelSlot, WithLabel},
  tensor::{EncodedTensor, encode},
  window::SequenceWindow,
};

mod shared;
mod transcript;

pub use self::shared::SharedClassifier;
pub use self::transcript::Transcript;

/// 默认置信度阈值
pub const DEFAULT_THRESHOLD: f32 = 0.25;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
  #[error("置信度阈值必须在 [0, 1] 之间, 实际为 {0}")]
  InvalidThreshold(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
  pub threshold: f32,
}

impl Default for ClassifierConfig {
  fn default() -> Self {
    Self {
      threshold: DEFAULT_THRESHOLD,
    }
  }
}

impl ClassifierConfig {
  pub fn with_threshold(mut self, threshold: f32) -> Self {
    self.threshold = threshold;
    self
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&self.threshold) {
      Ok(())
    } else {
      Err(ConfigError::InvalidThreshold(self.threshold))
    }
  }
}

#[derive(Error, Debug)]
pub enum ClassifierError {
  #[error("配置错误: {0}")]
  ConfigError(#[from] ConfigError),
  #[error("模型错误: {0}")]
  ModelError(#[from] ModelError),
}

/// 去抖状态：空闲，或者保持在上一次输出的手势上
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecognitionState {
  #[default]
  Idle,
  Holding(GestureLabel),
}

/// 没有得到输出的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  EmptyWindow,
  InvalidFrameShape(usize),
  ModelUnavailable,
  InferenceFailure,
}

/// 一次分类的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// 新手势，已追加到文本
  Emitted(GestureLabel),
  /// 与上一次相同，被去抖
  Held(GestureLabel),
  /// 置信度不足或下标越界，状态回到空闲
  Reset,
  /// 未完成分类，状态不变
  Skipped(SkipReason),
}

impl Outcome {
  pub fn emitted(&self) -> Option<GestureLabel> {
    match self {
      Outcome::Emitted(label) => Some(*label),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Outcome::Emitted(_) => "emitted",
      Outcome::Held(_) => "held",
      Outcome::Reset => "reset",
      Outcome::Skipped(_) => "skipped",
    }
  }
}

/// 一帧处理完后交给输出端的结果
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
  pub outcome: Outcome,
  /// 处理完这一帧后的完整文本
  pub text: String,
}

/// 滑动窗口 + 模型 + 去抖，输出累积的手势文本
pub struct GestureClassifier<M> {
  config: ClassifierConfig,
  window: SequenceWindow,
  state: RecognitionState,
  model: ModelSlot<M>,
  transcript: Transcript,
}

impl<M> GestureClassifier<M>
where
  M: Model<Input = EncodedTensor, Output = Confidences>,
  M::Error: std::fmt::Display,
{
  /// 创建尚未加载模型的分类器
  pub fn new(config: ClassifierConfig) -> Result<Self, ConfigError> {
    config.validate()?;
    Ok(Self {
      config,
      window: SequenceWindow::new(),
      state: RecognitionState::Idle,
      model: ModelSlot::default(),
      transcript: Transcript::default(),
    })
  }

  pub fn with_model(config: ClassifierConfig, model: M) -> Result<Self, ClassifierError> {
    let mut classifier = Self::new(config)?;
    classifier.install_model(model)?;
    Ok(classifier)
  }

  pub fn install_model(&mut self, model: M) -> Result<(), ModelError> {
    self.model.install(model)
  }

  /// 关闭模型，之后的分类都会被跳过
  pub fn close(&mut self) -> Option<M> {
    self.model.close()
  }

  pub fn config(&self) -> &ClassifierConfig {
    &self.config
  }

  pub fn window(&self) -> &SequenceWindow {
    &self.window
  }

  pub fn state(&self) -> RecognitionState {
    self.state
  }

  /// 累积文本的只读句柄
  pub fn transcript(&self) -> Transcript {
    self.transcript.clone()
  }

  pub fn text(&self) -> String {
    self.transcript.text()
  }

  /// 追加一帧并立即分类。无效帧直接丢弃，窗口与状态都不变。
  pub fn push_frame(&mut self, frame: LandmarkFrame) -> Result<Outcome, FrameError> {
    self.window.append(frame)?;
    Ok(self.classify())
  }

  /// 对当前窗口分类
  pub fn classify(&mut self) -> Outcome {
    let Some(latest) = self.window.latest() else {
      debug!("窗口为空，跳过分类");
      return Outcome::Skipped(SkipReason::EmptyWindow);
    };

    if let Err(FrameError::InvalidFrameShape(len)) = latest.validate() {
      warn!("最新帧关键点数量为 {}, 跳过分类", len);
      return Outcome::Skipped(SkipReason::InvalidFrameShape(len));
    }

    let model = match self.model.get() {
      Ok(model) => model,
      Err(e) => {
        warn!("模型不可用: {}", e);
        return Outcome::Skipped(SkipReason::ModelUnavailable);
      }
    };

    let tensor = encode(&self.window);
    let confidences = match model.infer(&tensor) {
      Ok(confidences) if !confidences.is_empty() => confidences,
      Ok(_) => {
        error!("模型推理失败: {}", ModelError::EmptyOutput);
        return Outcome::Skipped(SkipReason::InferenceFailure);
      }
      Err(e) => {
        error!("模型推理失败: {}", e);
        return Outcome::Skipped(SkipReason::InferenceFailure);
      }
    };

    self.decide(&confidences)
  }

  /// 根据置信度更新去抖状态
  pub fn decide(&mut self, confidences: &Confidences) -> Outcome {
    let best = confidences
      .argmax()
      .filter(|&(_, score)| score >= self.config.threshold)
      .and_then(|(index, score)| GestureLabel::from_label_id(index).map(|label| (label, score)));

    let Some((label, score)) = best else {
      if self.state != RecognitionState::Idle {
        debug!("置信度不足，重置识别状态");
      }
      self.state = RecognitionState::Idle;
      return Outcome::Reset;
    };

    if self.state == RecognitionState::Holding(label) {
      return Outcome::Held(label);
    }

    self.state = RecognitionState::Holding(label);
    self.transcript.push(label);
    info!("识别手势 {} ({:.2}): {}", label, score, self.transcript.text());
    Outcome::Emitted(label)
  }
}
