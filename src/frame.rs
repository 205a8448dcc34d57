// 该文件是 Shouyu （手语） 项目的一部分。
// src/frame.rs - 手部关键点帧定义
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

use serde::Deserialize;
use thiserror::Error;

/// 单只手的关键点数量
pub const HAND_LANDMARKS: usize = 21;
/// 最多检测的手数
pub const MAX_HANDS: usize = 2;
/// 一帧内最多的关键点数量（两只手展平）
pub const MAX_LANDMARKS: usize = HAND_LANDMARKS * MAX_HANDS;
/// 每个关键点的坐标分量 (x, y, z)
pub const LANDMARK_COORDS: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
  #[error("帧形状无效: 期望 21 或 42 个关键点, 实际 {0} 个")]
  InvalidFrameShape(usize),
}

/// 归一化的三维关键点
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(from = "[f32; 3]")]
pub struct Landmark {
  pub x: f32,
  pub y: f32,
  pub z: f32,
}

impl Landmark {
  pub fn new(x: f32, y: f32, z: f32) -> Self {
    Self { x, y, z }
  }

  pub fn to_array(self) -> [f32; LANDMARK_COORDS] {
    [self.x, self.y, self.z]
  }
}

impl From<[f32; LANDMARK_COORDS]> for Landmark {
  fn from([x, y, z]: [f32; LANDMARK_COORDS]) -> Self {
    Self { x, y, z }
  }
}

/// 一次检测得到的全部关键点，按手的顺序展平。
///
/// 构造时不做校验，形状由 [`LandmarkFrame::validate`] 检查，
/// 滑动窗口只接收合法的帧。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandmarkFrame {
  landmarks: Box<[Landmark]>,
}

impl From<Vec<Landmark>> for LandmarkFrame {
  fn from(landmarks: Vec<Landmark>) -> Self {
    Self {
      landmarks: landmarks.into_boxed_slice(),
    }
  }
}

impl LandmarkFrame {
  /// 将逐手输出的关键点展平为一帧
  pub fn from_hands<I, H>(hands: I) -> Self
  where
    I: IntoIterator<Item = H>,
    H: IntoIterator<Item = Landmark>,
  {
    let landmarks: Vec<Landmark> = hands.into_iter().flatten().collect();
    Self::from(landmarks)
  }

  pub fn is_valid_len(len: usize) -> bool {
    len == HAND_LANDMARKS || len == MAX_LANDMARKS
  }

  pub fn validate(&self) -> Result<(), FrameError> {
    if Self::is_valid_len(self.len()) {
      Ok(())
    } else {
      Err(FrameError::InvalidFrameShape(self.len()))
    }
  }

  pub fn len(&self) -> usize {
    self.landmarks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.landmarks.is_empty()
  }

  /// 帧内包含的手数（按 21 个关键点一只手计算）
  pub fn hands(&self) -> usize {
    self.len() / HAND_LANDMARKS
  }

  pub fn landmarks(&self) -> &[Landmark] {
    &self.landmarks
  }
}

impl AsRef<[Landmark]> for LandmarkFrame {
  fn as_ref(&self) -> &[Landmark] {
    &self.landmarks
  }
}

/// 带调用方时间戳的帧
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampedFrame {
  pub timestamp_ms: u64,
  pub frame: LandmarkFrame,
}

impl TimestampedFrame {
  pub fn new(timestamp_ms: u64, frame: LandmarkFrame) -> Self {
    Self {
      timestamp_ms,
      frame,
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  pub(crate) fn hand(seed: f32) -> Vec<Landmark> {
    (0..HAND_LANDMARKS)
      .map(|i| Landmark::new(seed, i as f32 / 100.0, -seed))
      .collect()
  }

  pub(crate) fn one_hand_frame(seed: f32) -> LandmarkFrame {
    LandmarkFrame::from(hand(seed))
  }

  pub(crate) fn two_hand_frame(seed: f32) -> LandmarkFrame {
    LandmarkFrame::from_hands([hand(seed), hand(seed + 0.5)])
  }

  #[test]
  fn accepts_one_or_two_hands() {
    assert!(one_hand_frame(0.1).validate().is_ok());
    assert!(two_hand_frame(0.1).validate().is_ok());
    assert_eq!(two_hand_frame(0.1).hands(), 2);
  }

  #[test]
  fn rejects_other_lengths() {
    for len in [0, 1, 20, 22, 41, 43, 63] {
      let frame = LandmarkFrame::from(vec![Landmark::default(); len]);
      assert_eq!(frame.validate(), Err(FrameError::InvalidFrameShape(len)));
    }
  }

  #[test]
  fn from_hands_keeps_hand_order() {
    let frame = LandmarkFrame::from_hands([hand(0.1), hand(0.7)]);
    assert_eq!(frame.landmarks()[0].x, 0.1);
    assert_eq!(frame.landmarks()[HAND_LANDMARKS].x, 0.7);
  }

  #[test]
  fn landmark_deserializes_from_triple() {
    let lm: Landmark = serde_json::from_str("[0.25, 0.5, -0.125]").unwrap();
    assert_eq!(lm, Landmark::new(0.25, 0.5, -0.125));
  }
}
