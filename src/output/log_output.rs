// 该文件是 Shouyu （手语） 项目的一部分。
// src/output/log_output.rs - 日志输出
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
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  classifier::{Outcome, Recognition},
  frame::TimestampedFrame,
  output::Render,
};

#[derive(Error, Debug)]
pub enum LogOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 通过 tracing 输出识别结果
#[derive(Debug, Default)]
pub struct LogOutput;

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl FromUrl for LogOutput {
  type Error = LogOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(LogOutputError::SchemeMismatch(format!(
        "期望输出方式 '{}', 实际输出方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }
    Ok(LogOutput)
  }
}

impl Render<TimestampedFrame, Recognition> for LogOutput {
  type Error = LogOutputError;

  fn render_result(
    &self,
    frame: &TimestampedFrame,
    result: &Recognition,
  ) -> Result<(), Self::Error> {
    match result.outcome {
      Outcome::Emitted(label) => {
        info!("[{} ms] 输出 {}, 当前文本: \"{}\"", frame.timestamp_ms, label, result.text)
      }
      outcome => debug!("[{} ms] {:?}", frame.timestamp_ms, outcome),
    }
    Ok(())
  }
}
