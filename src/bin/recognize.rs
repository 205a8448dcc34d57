// 该文件是 Shouyu （手语） 项目的一部分。
// src/bin/recognize.rs - 手语识别命令行程序
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

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use shouyu::{
  FromUrl,
  classifier::{ClassifierConfig, DEFAULT_THRESHOLD, GestureClassifier},
  input::InputWrapper,
  model::ModelWrapper,
  output::OutputWrapper,
  task::{ContinuousTask, Task},
};

/// Shouyu 手语识别参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型来源，onnx:// 或 replay://
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 关键点输入来源，jsonl://
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出方式，log://、text:// 或 record://
  #[arg(long, value_name = "OUTPUT", default_value = "log://")]
  pub output: Url,
  /// 置信度阈值
  #[arg(long, value_name = "THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
  pub threshold: f32,

  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let args = Args::parse();

  info!("模型来源: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出方式: {}", args.output);
  info!("置信度阈值: {}", args.threshold);

  let config = ClassifierConfig::default().with_threshold(args.threshold);
  let model = ModelWrapper::from_url(&args.model)?;
  let classifier = GestureClassifier::with_model(config, model)?;
  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let summary = ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .with_interrupt(true)
    .run_task(input, classifier, output)?;

  println!("{}", summary.text.trim_start());
  Ok(())
}
