use anyhow::{Context, Result};
use chapter_query::utils::logging::{append_report, init_log_file};
use chapter_query::{logger, Config, ModelRouter, QueryRunner, RunConfig};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// 批量Query-Answer处理工具
#[derive(Parser, Debug)]
#[command(name = "chapter-query", version, about)]
struct Cli {
    /// 输入目录，包含多个txt文件
    #[arg(long)]
    input_path: PathBuf,
    /// 输出目录，保存处理后的txt文件
    #[arg(long)]
    output_path: PathBuf,
    /// 提供商ID，如zhipu、aliyun等（默认取配置文件中的 default_provider）
    #[arg(long)]
    provider: Option<String>,
    /// 模型ID（默认取配置文件中的 default_model）
    #[arg(long)]
    model: Option<String>,
    /// 并发数量
    #[arg(long, default_value_t = 1)]
    concurrent: usize,
    /// 一个批次的大小
    #[arg(long, default_value_t = 10)]
    batch_size: usize,
    /// LLM调用指令文件路径，需包含{input_content}占位符
    #[arg(long)]
    prompt_path: PathBuf,
    /// 输出文件名前缀
    #[arg(long, default_value = "查询结果")]
    name_prefix: String,
    /// 起始位置（从1开始）
    #[arg(long)]
    start_pos: Option<usize>,
    /// 终止位置（含）
    #[arg(long)]
    end_pos: Option<usize>,
    /// LLM 厂商配置文件
    #[arg(long, default_value = "configs/config.toml")]
    config: PathBuf,
    /// 运行日志文件（写入表头和每个批次的结果）
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// 以 JSON 输出运行报告
    #[arg(long)]
    json: bool,
}

/// 128 + SIGINT
const FORCE_EXIT_CODE: i32 = 130;

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    Cancel,
    ForceExit,
}

fn on_interrupt(received: usize) -> Interrupt {
    if received <= 1 {
        Interrupt::Cancel
    } else {
        Interrupt::ForceExit
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    let started = Instant::now();
    let result = run(Cli::parse()).await;
    let elapsed = started.elapsed().as_secs_f64();

    match &result {
        Ok(()) => info!("所有任务处理完成，总耗时: {:.6} 秒", elapsed),
        Err(e) => error!("处理过程发生错误，总耗时: {:.6} 秒，错误信息: {:#}", elapsed, e),
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    // 加载配置
    let config = Config::load(&cli.config)
        .await
        .with_context(|| format!("无法加载配置文件: {}", cli.config.display()))?;
    let (provider_id, model_id) = config.resolve_selection(cli.provider, cli.model)?;

    if let Some(log_file) = &cli.log_file {
        init_log_file(log_file)?;
    }

    let run_config = RunConfig {
        input_dir: cli.input_path,
        output_dir: cli.output_path,
        provider_id,
        model_id,
        concurrency: cli.concurrent,
        batch_size: cli.batch_size,
        prompt_path: cli.prompt_path,
        name_prefix: cli.name_prefix,
        start_pos: cli.start_pos,
        end_pos: cli.end_pos,
    };

    let runner = QueryRunner::new(run_config, Arc::new(ModelRouter::new(&config)));

    // 第一次 Ctrl-C 只发出中止请求，已发起的调用会正常结束；再按一次强制退出
    let gate = runner.cancellation_gate();
    tokio::spawn(async move {
        let mut received = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            received += 1;
            match on_interrupt(received) {
                Interrupt::Cancel => {
                    warn!("收到 Ctrl-C，停止派发新的批次，等待进行中的调用结束（再按一次强制退出）...");
                    gate.request_cancel();
                }
                Interrupt::ForceExit => {
                    error!("再次收到 Ctrl-C，强制退出");
                    std::process::exit(FORCE_EXIT_CODE);
                }
            }
        }
    });

    let report = runner.run().await?;

    if let Some(log_file) = &cli.log_file {
        append_report(log_file, &report)?;
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_interrupt_forces_exit() {
        assert_eq!(on_interrupt(1), Interrupt::Cancel);
        assert_eq!(on_interrupt(2), Interrupt::ForceExit);
        assert_eq!(on_interrupt(5), Interrupt::ForceExit);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from([
            "chapter-query",
            "--input-path",
            "in",
            "--output-path",
            "out",
            "--prompt-path",
            "p.txt",
        ])
        .unwrap();
        assert_eq!(cli.concurrent, 1);
        assert_eq!(cli.batch_size, 10);
        assert_eq!(cli.name_prefix, "查询结果");
        assert!(cli.provider.is_none());
    }
}
