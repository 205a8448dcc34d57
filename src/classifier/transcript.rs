// 该文件是 Shouyu （手语） 项目的一部分。
// src/classifier/transcript.rs - 识别文本
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

use std::sync::{
  Arc, Mutex, MutexGuard, PoisonError,
  mpsc::{Receiver, SyncSender, TrySendError, sync_channel},
};

use tracing::warn;

use crate::model::{GestureLabel, WithLabel};

/// 每个订阅者最多积压的手势数
pub const SUBSCRIBER_BACKLOG: usize = 64;

#[derive(Debug, Default)]
struct Inner {
  text: String,
  subscribers: Vec<SyncSender<GestureLabel>>,
}

/// 只追加的识别文本。克隆得到的是同一份文本的只读句柄，
/// 只有持有它的分类器可以追加。
#[derive(Debug, Clone, Default)]
pub struct Transcript {
  inner: Arc<Mutex<Inner>>,
}

impl Transcript {
  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn text(&self) -> String {
    self.lock().text.clone()
  }

  pub fn len(&self) -> usize {
    self.lock().text.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().text.is_empty()
  }

  /// 订阅之后输出的每一个手势。
  ///
  /// 积压超过 [`SUBSCRIBER_BACKLOG`] 的订阅者会被移除，接收端随后只能读完已有的手势。
  pub fn subscribe(&self) -> Receiver<GestureLabel> {
    let (tx, rx) = sync_channel(SUBSCRIBER_BACKLOG);
    self.lock().subscribers.push(tx);
    rx
  }

  pub(crate) fn push(&self, label: GestureLabel) {
    let mut inner = self.lock();
    inner.text.push(' ');
    inner.text.push_str(label.to_label_str());
    inner.subscribers.retain(|tx| match tx.try_send(label) {
      Ok(()) => true,
      Err(TrySendError::Full(_)) => {
        warn!("订阅者积压超过 {} 个手势，取消订阅", SUBSCRIBER_BACKLOG);
        false
      }
      Err(TrySendError::Disconnected(_)) => false,
    });
  }
}
