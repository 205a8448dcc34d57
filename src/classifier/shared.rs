// 该文件是 Shouyu （手语） 项目的一部分。
// src/classifier/shared.rs - 多线程共享的分类器
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

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
  classifier::{GestureClassifier, Outcome, Transcript},
  frame::{FrameError, LandmarkFrame},
  model::{Confidences, Model},
  tensor::EncodedTensor,
};

/// 在一把锁内完成追加与分类，窗口和去抖状态不会被并发调用交错修改
pub struct SharedClassifier<M> {
  inner: Mutex<GestureClassifier<M>>,
  transcript: Transcript,
}

impl<M> SharedClassifier<M>
where
  M: Model<Input = EncodedTensor, Output = Confidences>,
  M::Error: std::fmt::Display,
{
  pub fn new(classifier: GestureClassifier<M>) -> Self {
    let transcript = classifier.transcript();
    Self {
      inner: Mutex::new(classifier),
      transcript,
    }
  }

  fn lock(&self) -> MutexGuard<'_, GestureClassifier<M>> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn process(&self, frame: LandmarkFrame) -> Result<Outcome, FrameError> {
    self.lock().push_frame(frame)
  }

  /// 读取文本不需要拿分类器的锁
  pub fn transcript(&self) -> Transcript {
    self.transcript.clone()
  }

  pub fn with_locked<R>(&self, f: impl FnOnce(&mut GestureClassifier<M>) -> R) -> R {
    f(&mut self.lock())
  }

  pub fn into_inner(self) -> GestureClassifier<M> {
    self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
  }
}
