// 该文件是 Shouyu （手语） 项目的一部分。
// src/window.rs - 关键点序列滑动窗口
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

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::frame::{FrameError, LandmarkFrame};

/// 窗口容量（帧）
pub const WINDOW_CAPACITY: usize = 10;

/// 最近若干帧的 FIFO 窗口，超出容量时丢弃最旧的帧
#[derive(Debug, Clone, Default)]
pub struct SequenceWindow {
  frames: VecDeque<LandmarkFrame>,
}

impl SequenceWindow {
  pub fn new() -> Self {
    Self {
      frames: VecDeque::with_capacity(WINDOW_CAPACITY + 1),
    }
  }

  /// 追加一帧，返回被挤出的最旧帧。
  ///
  /// 关键点数量不是 21 或 42 时返回 [`FrameError::InvalidFrameShape`]，窗口保持不变。
  pub fn append(&mut self, frame: LandmarkFrame) -> Result<Option<LandmarkFrame>, FrameError> {
    if let Err(e) = frame.validate() {
      warn!("丢弃无效帧: {}", e);
      return Err(e);
    }

    self.frames.push_back(frame);
    let evicted = if self.frames.len() > WINDOW_CAPACITY {
      self.frames.pop_front()
    } else {
      None
    };

    debug!("窗口长度: {}/{}", self.frames.len(), WINDOW_CAPACITY);
    Ok(evicted)
  }

  pub fn len(&self) -> usize {
    self.frames.len()
  }

  pub fn is_empty(&self) -> bool {
    self.frames.is_empty()
  }

  pub fn is_full(&self) -> bool {
    self.frames.len() == WINDOW_CAPACITY
  }

  /// 最近到达的一帧
  pub fn latest(&self) -> Option<&LandmarkFrame> {
    self.frames.back()
  }

  /// 按到达顺序遍历（最旧的在前）
  pub fn iter(&self) -> impl ExactSizeIterator<Item = &LandmarkFrame> {
    self.frames.iter()
  }

  pub fn clear(&mut self) {
    self.frames.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::{
    Landmark,
    tests::{one_hand_frame, two_hand_frame},
  };

  #[test]
  fn never_exceeds_capacity_and_keeps_last_frames() {
    let mut window = SequenceWindow::new();
    let frames: Vec<_> = (0..25)
      .map(|i| {
        if i % 2 == 0 {
          one_hand_frame(i as f32)
        } else {
          two_hand_frame(i as f32)
        }
      })
      .collect();

    for frame in &frames {
      window.append(frame.clone()).unwrap();
      assert!(window.len() <= WINDOW_CAPACITY);
    }

    let kept: Vec<_> = window.iter().cloned().collect();
    assert_eq!(kept, frames[frames.len() - WINDOW_CAPACITY..]);
    assert!(window.is_full());
  }

  #[test]
  fn evicts_oldest_first() {
    let mut window = SequenceWindow::new();
    for i in 0..WINDOW_CAPACITY {
      assert_eq!(window.append(one_hand_frame(i as f32)).unwrap(), None);
    }
    let evicted = window.append(one_hand_frame(99.0)).unwrap();
    assert_eq!(evicted, Some(one_hand_frame(0.0)));
    assert_eq!(window.latest(), Some(&one_hand_frame(99.0)));
  }

  #[test]
  fn invalid_frame_leaves_window_unchanged() {
    let mut window = SequenceWindow::new();
    window.append(one_hand_frame(0.1)).unwrap();
    window.append(two_hand_frame(0.2)).unwrap();
    let before: Vec<_> = window.iter().cloned().collect();

    let bad = LandmarkFrame::from(vec![Landmark::default(); 30]);
    assert_eq!(window.append(bad), Err(FrameError::InvalidFrameShape(30)));

    let after: Vec<_> = window.iter().cloned().collect();
    assert_eq!(before, after);
  }

  #[test]
  fn empty_frame_is_rejected() {
    let mut window = SequenceWindow::new();
    assert!(window.append(LandmarkFrame::default()).is_err());
    assert!(window.is_empty());
  }
}
