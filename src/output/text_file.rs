// 该文件是 Shouyu （手语） 项目的一部分。
// src/output/text_file.rs - 文本文件输出
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

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  classifier::{Outcome, Recognition},
  frame::TimestampedFrame,
  output::Render,
};

#[derive(Error, Debug)]
pub enum TextFileOutputError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

/// 每次输出新手势时用完整文本覆盖目标文件，供显示端轮询
pub struct TextFileOutput {
  path: PathBuf,
}

impl FromUrlWithScheme for TextFileOutput {
  const SCHEME: &'static str = "text";
}

impl FromUrl for TextFileOutput {
  type Error = TextFileOutputError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(TextFileOutputError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(TextFileOutput {
      path: PathBuf::from(uri.path()),
    })
  }
}

impl TextFileOutput {
  pub fn path(&self) -> &Path {
    &self.path
  }

  fn tmp_path(&self) -> PathBuf {
    let mut name = self.path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    self.path.with_file_name(name)
  }

  fn save_text(&self, text: &str) -> Result<(), TextFileOutputError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    // 先写临时文件再重命名，轮询方不会读到半截内容
    let tmp = self.tmp_path();
    std::fs::write(&tmp, text)?;
    std::fs::rename(&tmp, &self.path)?;
    debug!("保存文本到文件: {}", self.path.display());

    Ok(())
  }
}

impl Render<TimestampedFrame, Recognition> for TextFileOutput {
  type Error = TextFileOutputError;

  fn render_result(
    &self,
    _frame: &TimestampedFrame,
    result: &Recognition,
  ) -> Result<(), Self::Error> {
    if let Outcome::Emitted(_) = result.outcome {
      self.save_text(&result.text)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{frame::LandmarkFrame, model::GestureLabel};

  #[test]
  fn writes_only_on_emission() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("out.txt");
    let url = Url::parse(&format!("text://{}", path.display())).unwrap();
    let output = TextFileOutput::from_url(&url).unwrap();
    let frame = TimestampedFrame::new(0, LandmarkFrame::default());

    let held = Recognition {
      outcome: Outcome::Held(GestureLabel::A),
      text: " a".to_string(),
    };
    output.render_result(&frame, &held).unwrap();
    assert!(!path.exists());

    let emitted = Recognition {
      outcome: Outcome::Emitted(GestureLabel::B),
      text: " a b".to_string(),
    };
    output.render_result(&frame, &emitted).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), " a b");
  }

  #[test]
  fn replaces_file_without_leftovers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");
    std::fs::write(&path, "stale content that is longer").unwrap();
    let url = Url::parse(&format!("text://{}", path.display())).unwrap();
    let output = TextFileOutput::from_url(&url).unwrap();
    let frame = TimestampedFrame::new(0, LandmarkFrame::default());

    let emitted = Recognition {
      outcome: Outcome::Emitted(GestureLabel::C),
      text: " c".to_string(),
    };
    output.render_result(&frame, &emitted).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), " c");
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
  }
}
