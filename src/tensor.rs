// 该文件是 Shouyu （手语） 项目的一部分。
// src/tensor.rs - 窗口张量编码
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

use crate::{
  frame::{LANDMARK_COORDS, MAX_LANDMARKS},
  window::{SequenceWindow, WINDOW_CAPACITY},
};

/// 张量中的帧数
pub const TENSOR_FRAMES: usize = WINDOW_CAPACITY;
/// 每帧的数值个数 (42 × 3)
pub const VALUES_PER_FRAME: usize = MAX_LANDMARKS * LANDMARK_COORDS;
/// 张量总长度
pub const TENSOR_LEN: usize = TENSOR_FRAMES * VALUES_PER_FRAME;
/// 张量形状 [帧, 数值]
pub const TENSOR_SHAPE: [usize; 2] = [TENSOR_FRAMES, VALUES_PER_FRAME];

/// 固定形状 [10, 126] 的模型输入
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTensor {
  data: Box<[f32]>,
}

impl Default for EncodedTensor {
  fn default() -> Self {
    Self {
      data: vec![0.0; TENSOR_LEN].into_boxed_slice(),
    }
  }
}

impl EncodedTensor {
  pub fn shape(&self) -> [usize; 2] {
    TENSOR_SHAPE
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }

  /// 第 `n` 帧对应的 126 个数值
  pub fn frame(&self, n: usize) -> Option<&[f32]> {
    self.data.get(n * VALUES_PER_FRAME..(n + 1) * VALUES_PER_FRAME)
  }

  /// 按本机字节序序列化
  pub fn to_ne_bytes(&self) -> Vec<u8> {
    self.data.iter().flat_map(|v| v.to_ne_bytes()).collect()
  }
}

impl AsRef<[f32]> for EncodedTensor {
  fn as_ref(&self) -> &[f32] {
    &self.data
  }
}

/// 将窗口编码为张量。
///
/// 帧优先，其次关键点，最后 (x, y, z)。窗口之外的帧和帧内缺失的关键点都补零。
pub fn encode(window: &SequenceWindow) -> EncodedTensor {
  let mut tensor = EncodedTensor::default();

  for (row, frame) in tensor
    .data
    .chunks_exact_mut(VALUES_PER_FRAME)
    .zip(window.iter())
  {
    for (slot, landmark) in row
      .chunks_exact_mut(LANDMARK_COORDS)
      .zip(frame.landmarks())
    {
      slot.copy_from_slice(&landmark.to_array());
    }
  }

  tensor
}
