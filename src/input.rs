// 该文件是 Shouyu （手语） 项目的一部分。
// src/input.rs - 关键点输入
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

use crate::{FromUrl, frame::TimestampedFrame};

mod jsonl;
pub use self::jsonl::{JsonlInput, JsonlInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[error("JSON Lines 输入错误: {0}")]
  JsonlInputError(#[from] JsonlInputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// 按 URI 方案选择的关键点来源
pub enum InputWrapper {
  Jsonl(JsonlInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    use crate::FromUrlWithScheme;

    if url.scheme() == <JsonlInput>::SCHEME {
      let input = <JsonlInput>::from_url(url)?;
      return Ok(InputWrapper::Jsonl(input));
    }
    Err(InputError::SchemeMismatch)
  }
}

impl Iterator for InputWrapper {
  type Item = TimestampedFrame;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      InputWrapper::Jsonl(input) => input.next(),
    }
  }
}
