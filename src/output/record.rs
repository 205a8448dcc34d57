// 该文件是 Shouyu （手语） 项目的一部分。
// src/output/record.rs - 识别记录输出
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

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  classifier::{Outcome, Recognition},
  frame::TimestampedFrame,
  model::GestureLabel,
  output::Render,
};

#[derive(Error, Debug)]
pub enum RecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct RecordLine<'a> {
  time: String,
  timestamp_ms: u64,
  landmarks: usize,
  outcome: &'static str,
  label: Option<GestureLabel>,
  text: &'a str,
}

/// 以 JSON Lines 追加每一帧的识别结果。
///
/// 默认只记录输出了新手势的帧，`?always` 记录所有帧。
pub struct RecordOutput {
  path: PathBuf,
  file: Mutex<File>,
  always: bool,
}

impl FromUrlWithScheme for RecordOutput {
  const SCHEME: &'static str = "record";
}

impl FromUrl for RecordOutput {
  type Error = RecordOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(RecordOutputError::SchemeMismatch);
    }

    let always = uri.query_pairs().any(|(k, _)| k == "always");

    let path = PathBuf::from(uri.path());
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    Ok(RecordOutput {
      path,
      file: Mutex::new(file),
      always,
    })
  }
}

impl RecordOutput {
  pub fn path(&self) -> &PathBuf {
    &self.path
  }
}

impl Render<TimestampedFrame, Recognition> for RecordOutput {
  type Error = RecordOutputError;

  fn render_result(
    &self,
    frame: &TimestampedFrame,
    result: &Recognition,
  ) -> Result<(), Self::Error> {
    let label = result.outcome.emitted();
    if !self.always && label.is_none() {
      return Ok(());
    }

    let label = match result.outcome {
      Outcome::Emitted(label) | Outcome::Held(label) => Some(label),
      _ => None,
    };
    let line = RecordLine {
      time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
      timestamp_ms: frame.timestamp_ms,
      landmarks: frame.frame.len(),
      outcome: result.outcome.as_str(),
      label,
      text: &result.text,
    };

    let mut json = serde_json::to_string(&line)?;
    json.push('\n');

    let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
    file.write_all(json.as_bytes())?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::LandmarkFrame;

  fn lines(path: &std::path::Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
      .unwrap()
      .lines()
      .map(|l| serde_json::from_str(l).unwrap())
      .collect()
  }

  #[test]
  fn records_emissions_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record.jsonl");
    let url = Url::parse(&format!("record://{}", path.display())).unwrap();
    let output = RecordOutput::from_url(&url).unwrap();
    let frame = TimestampedFrame::new(42, LandmarkFrame::default());

    output
      .render_result(
        &frame,
        &Recognition {
          outcome: Outcome::Reset,
          text: String::new(),
        },
      )
      .unwrap();
    output
      .render_result(
        &frame,
        &Recognition {
          outcome: Outcome::Emitted(GestureLabel::N),
          text: " n".to_string(),
        },
      )
      .unwrap();

    let lines = lines(&path);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["label"], "n");
    assert_eq!(lines[0]["timestamp_ms"], 42);
    assert_eq!(lines[0]["text"], " n");
  }

  #[test]
  fn always_records_every_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record.jsonl");
    let url = Url::parse(&format!("record://{}?always", path.display())).unwrap();
    let output = RecordOutput::from_url(&url).unwrap();
    let frame = TimestampedFrame::new(7, LandmarkFrame::default());

    output
      .render_result(
        &frame,
        &Recognition {
          outcome: Outcome::Held(GestureLabel::A),
          text: " a".to_string(),
        },
      )
      .unwrap();

    let lines = lines(&path);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["outcome"], "held");
    assert_eq!(lines[0]["label"], "a");
  }
}
