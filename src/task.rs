// 该文件是 Shouyu （手语） 项目的一部分。
// src/task.rs - 识别任务
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

use std::{
  sync::mpsc::{Receiver, channel},
  thread,
  time::{Duration, Instant},
};
use tracing::{info, warn};

use crate::{
  classifier::{GestureClassifier, Outcome, Recognition, SkipReason},
  frame::{FrameError, TimestampedFrame},
  model::{Confidences, Model},
  output::Render,
  tensor::EncodedTensor,
};

pub trait Task<I, C, O>: Sized {
  type Error;
  fn run_task(self, input: I, classifier: C, output: O) -> Result<TaskSummary, Self::Error>;
}

/// 任务结束时的统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSummary {
  pub frames: usize,
  pub rejected: usize,
  pub emitted: usize,
  pub text: String,
}

#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  interruptible: bool,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 收到 Ctrl-C 时结束任务循环，每个进程只能设置一次
  pub fn with_interrupt(mut self, interruptible: bool) -> Self {
    self.interruptible = interruptible;
    self
  }

  fn install_interrupt(&self) -> anyhow::Result<Option<Receiver<()>>> {
    if !self.interruptible {
      return Ok(None);
    }

    let (tx, rx) = channel();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;
    Ok(Some(rx))
  }
}

impl<M, ME, RE, I, O> Task<I, GestureClassifier<M>, O> for ContinuousTask
where
  ME: std::fmt::Display,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = TimestampedFrame>,
  M: Model<Input = EncodedTensor, Output = Confidences, Error = ME>,
  O: Render<TimestampedFrame, Recognition, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    input: I,
    mut classifier: GestureClassifier<M>,
    output: O,
  ) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let interrupt = self.install_interrupt()?;

    let mut summary = TaskSummary::default();
    let mut frame_index = 0;
    for frame in input {
      frame_index += 1;
      info!("处理第 {} 帧 ({} ms)", frame_index, frame.timestamp_ms);

      let now = Instant::now();
      match classifier.push_frame(frame.frame.clone()) {
        Ok(outcome) => {
          let elapsed_a = now.elapsed();
          if outcome.emitted().is_some() {
            summary.emitted += 1;
          }
          let result = Recognition {
            outcome,
            text: classifier.text(),
          };
          output.render_result(&frame, &result)?;
          let elapsed_b = now.elapsed();
          info!("识别完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);
        }
        Err(e) => {
          warn!("第 {} 帧被丢弃: {}", frame_index, e);
          summary.rejected += 1;
          let FrameError::InvalidFrameShape(len) = e;
          let result = Recognition {
            outcome: Outcome::Skipped(SkipReason::InvalidFrameShape(len)),
            text: classifier.text(),
          };
          output.render_result(&frame, &result)?;
        }
      }
      summary.frames += 1;

      if self.frame_number.map(|n| frame_index >= n).unwrap_or(false) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
      if interrupt.as_ref().is_some_and(|rx| rx.try_recv().is_ok()) {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    summary.text = classifier.text();
    info!(
      "任务完成: 共 {} 帧, 丢弃 {} 帧, 输出 {} 个手势, 文本: \"{}\"",
      summary.frames, summary.rejected, summary.emitted, summary.text
    );
    Ok(summary)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    classifier::ClassifierConfig,
    frame::{
      Landmark, LandmarkFrame,
      tests::{one_hand_frame, two_hand_frame},
    },
    model::{GestureLabel, ReplayModel},
  };
  use std::cell::RefCell;

  #[derive(Default)]
  struct Collect(RefCell<Vec<Outcome>>);

  impl Render<TimestampedFrame, Recognition> for &Collect {
    type Error = std::io::Error;

    fn render_result(&self, _: &TimestampedFrame, result: &Recognition) -> Result<(), Self::Error> {
      self.0.borrow_mut().push(result.outcome);
      Ok(())
    }
  }

  fn frames() -> Vec<TimestampedFrame> {
    vec![
      TimestampedFrame::new(0, one_hand_frame(0.1)),
      TimestampedFrame::new(33, two_hand_frame(0.2)),
      TimestampedFrame::new(66, LandmarkFrame::from(vec![Landmark::default(); 3])),
      TimestampedFrame::new(99, one_hand_frame(0.3)),
    ]
  }

  fn classifier() -> GestureClassifier<ReplayModel> {
    let model = ReplayModel::new(vec![
      Some(vec![0.9, 0.0, 0.0, 0.0, 0.0]),
      Some(vec![0.9, 0.0, 0.0, 0.0, 0.0]),
      Some(vec![0.0, 0.8, 0.0, 0.0, 0.0]),
    ])
    .unwrap();
    GestureClassifier::with_model(ClassifierConfig::default(), model).unwrap()
  }

  #[test]
  fn runs_until_input_ends() {
    let collect = Collect::default();
    let summary = ContinuousTask::default()
      .run_task(frames().into_iter(), classifier(), &collect)
      .unwrap();

    assert_eq!(
      summary,
      TaskSummary {
        frames: 4,
        rejected: 1,
        emitted: 2,
        text: " a b".to_string(),
      }
    );
    assert_eq!(
      *collect.0.borrow(),
      vec![
        Outcome::Emitted(GestureLabel::A),
        Outcome::Held(GestureLabel::A),
        Outcome::Skipped(SkipReason::InvalidFrameShape(3)),
        Outcome::Emitted(GestureLabel::B),
      ]
    );
  }

  #[test]
  fn stops_at_frame_number() {
    let collect = Collect::default();
    let summary = ContinuousTask::default()
      .with_frame_number(Some(2))
      .run_task(frames().into_iter(), classifier(), &collect)
      .unwrap();

    assert_eq!(summary.frames, 2);
    assert_eq!(summary.text, " a");
  }
}
