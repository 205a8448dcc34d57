// 该文件是 Shouyu （手语） 项目的一部分。
// src/model/slot.rs - 模型生命周期
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

use tracing::{debug, info};

use crate::model::{Model, ModelError, check_input_shape, check_output_shape};

/// 模型句柄：`Uninitialized → Ready → Closed`，只有 `Ready` 状态可以推理
#[derive(Debug)]
pub enum ModelSlot<M> {
  Uninitialized,
  Ready(M),
  Closed,
}

impl<M> Default for ModelSlot<M> {
  fn default() -> Self {
    ModelSlot::Uninitialized
  }
}

impl<M: Model> ModelSlot<M> {
  /// 校验模型声明的形状并进入 `Ready` 状态，已关闭的句柄不能再安装
  pub fn install(&mut self, model: M) -> Result<(), ModelError> {
    if self.is_closed() {
      return Err(ModelError::Closed);
    }

    debug!("模型输入形状: {:?}", model.input_shape());
    debug!("模型输出形状: {:?}", model.output_shape());
    check_input_shape(model.input_shape())?;
    check_output_shape(model.output_shape())?;

    if self.is_ready() {
      info!("替换已加载的模型");
    }
    *self = ModelSlot::Ready(model);
    Ok(())
  }

  pub fn get(&self) -> Result<&M, ModelError> {
    match self {
      ModelSlot::Uninitialized => Err(ModelError::NotReady),
      ModelSlot::Ready(model) => Ok(model),
      ModelSlot::Closed => Err(ModelError::Closed),
    }
  }

  /// 关闭句柄并交还模型
  pub fn close(&mut self) -> Option<M> {
    match std::mem::replace(self, ModelSlot::Closed) {
      ModelSlot::Ready(model) => {
        info!("模型已关闭");
        Some(model)
      }
      _ => None,
    }
  }

  pub fn is_ready(&self) -> bool {
    matches!(self, ModelSlot::Ready(_))
  }

  pub fn is_closed(&self) -> bool {
    matches!(self, ModelSlot::Closed)
  }
}
