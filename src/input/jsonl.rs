// 该文件是 Shouyu （手语） 项目的一部分。
// src/input/jsonl.rs - 录制的关键点检测结果输入
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
  fs::File,
  io::{BufRead, BufReader},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{Landmark, LandmarkFrame, TimestampedFrame},
};

#[derive(Error, Debug)]
pub enum JsonlInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
}

/// 每行一次检测: `{"timestamp_ms": 33, "hands": [[[x, y, z], ...], ...]}`
#[derive(Debug, Deserialize)]
struct DetectionRecord {
  #[serde(default)]
  timestamp_ms: Option<u64>,
  hands: Vec<Vec<Landmark>>,
}

/// 逐行读取 JSON Lines 格式的检测结果。
///
/// 空行和没有检测到手的行会被跳过，无法解析的行记录警告后跳过，读取错误结束迭代。
pub struct JsonlInput<R = BufReader<File>> {
  reader: R,
  line_no: usize,
  buf: Vec<u8>,
}

impl FromUrlWithScheme for JsonlInput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonlInput {
  type Error = JsonlInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI 方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(JsonlInputError::SchemaMismatch);
    }

    info!("打开关键点文件: {}", url.path());
    let file = File::open(url.path())?;
    Ok(JsonlInput::from_reader(BufReader::new(file)))
  }
}

impl<R: BufRead> JsonlInput<R> {
  pub fn from_reader(reader: R) -> Self {
    Self {
      reader,
      line_no: 0,
      buf: Vec::new(),
    }
  }
}

impl<R: BufRead> Iterator for JsonlInput<R> {
  type Item = TimestampedFrame;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      self.buf.clear();
      match self.reader.read_until(b'\n', &mut self.buf) {
        Ok(0) => return None,
        Ok(_) => {}
        Err(e) => {
          error!("读取第 {} 行失败: {}", self.line_no + 1, e);
          return None;
        }
      }
      self.line_no += 1;

      let line = match std::str::from_utf8(&self.buf) {
        Ok(line) => line.trim(),
        Err(e) => {
          warn!("第 {} 行不是有效的 UTF-8: {}", self.line_no, e);
          continue;
        }
      };
      if line.is_empty() {
        continue;
      }

      let record: DetectionRecord = match serde_json::from_str(line) {
        Ok(record) => record,
        Err(e) => {
          warn!("第 {} 行解析失败: {}", self.line_no, e);
          continue;
        }
      };

      if record.hands.is_empty() {
        debug!("第 {} 行没有检测到手", self.line_no);
        continue;
      }

      let timestamp_ms = record.timestamp_ms.unwrap_or(self.line_no as u64);
      let frame = LandmarkFrame::from_hands(record.hands);
      return Some(TimestampedFrame::new(timestamp_ms, frame));
    }
  }
}
