//! vdec-cli - H.264 帧解码管线命令行工具
//!
//! 读取 Annex B 码流文件, 按访问单元逐个送入解码管线,
//! 可选地把每一帧原样写入输出文件, 最后打印统计信息.

mod access_unit;
mod logging;

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use bytes::Bytes;
use clap::Parser;
use log::{info, warn};

use vdec_codec::{DecodeOutcome, DecoderConfig, H264FrameDecoder};
use vdec_core::PixelFormat;

use access_unit::{is_keyframe, split_access_units};

#[derive(Parser, Debug)]
#[command(name = "vdec-cli", version, about = "H.264 帧解码管线命令行工具")]
struct Cli {
    /// 输入 Annex B 码流文件
    input: PathBuf,

    /// 原始帧输出文件 (所有帧首尾相接)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON 配置文件, 命令行参数覆盖其中的字段
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 最大帧宽度
    #[arg(long)]
    width: Option<u32>,

    /// 最大帧高度
    #[arg(long)]
    height: Option<u32>,

    /// 输出像素格式 (YUV420P / RGB565 / RGB888)
    #[arg(short = 'f', long = "format")]
    pixel_format: Option<PixelFormat>,

    /// 帧缓冲区大小 (字节, 0 表示自动计算)
    #[arg(long)]
    buffer_size: Option<usize>,

    /// 输入暂存缓冲区容量 (字节)
    #[arg(long)]
    input_buffer_size: Option<usize>,

    /// 指定解码引擎
    #[arg(long)]
    engine: Option<String>,

    /// 最多解码的访问单元数 (一个访问单元为一幅图像的全部切片)
    #[arg(short = 'n', long)]
    max_units: Option<usize>,

    /// 日志目录
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// 日志级别 (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// 从 JSON 文件读取配置
fn load_config(path: &Path) -> Result<DecoderConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("解析配置文件失败: {}", path.display()))
}

/// 合并配置文件与命令行参数
fn resolve_config(cli: &Cli) -> Result<DecoderConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DecoderConfig::default(),
    };
    if let Some(w) = cli.width {
        config.max_width = w;
    }
    if let Some(h) = cli.height {
        config.max_height = h;
    }
    if let Some(pf) = cli.pixel_format {
        config.pixel_format = pf;
    }
    if let Some(size) = cli.buffer_size {
        config.frame_buffer_size = size;
    }
    if let Some(size) = cli.input_buffer_size {
        config.input_buffer_size = size;
    }
    if let Some(engine) = &cli.engine {
        config.engine = Some(engine.clone());
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    let stream = Bytes::from(
        std::fs::read(&cli.input)
            .with_context(|| format!("读取输入文件失败: {}", cli.input.display()))?,
    );

    let mut decoder = H264FrameDecoder::new();
    decoder.set_config(config)?;
    decoder.initialize().context("初始化解码器失败")?;
    decoder.dump_config();

    // 观察者不能返回错误, 写入失败记录在此处, 解码结束后统一报告
    let write_error: Rc<RefCell<Option<std::io::Error>>> = Rc::new(RefCell::new(None));
    let writer = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("创建输出文件失败: {}", path.display()))?;
            Some(Rc::new(RefCell::new(BufWriter::new(file))))
        }
        None => None,
    };
    if let Some(writer) = &writer {
        let writer = Rc::clone(writer);
        let write_error = Rc::clone(&write_error);
        decoder.register_frame_observer(move |frame| {
            if write_error.borrow().is_some() {
                return;
            }
            if let Err(e) = writer.borrow_mut().write_all(frame.data()) {
                *write_error.borrow_mut() = Some(e);
            }
        });
    }
    decoder.register_frame_observer(|frame| {
        log::debug!(
            "帧: {}x{} {} {} 字节, ts={}us",
            frame.width(),
            frame.height(),
            frame.format(),
            frame.len(),
            frame.timestamp()
        );
    });
    decoder.register_error_observer(|err| warn!("解码错误: {err}"));

    let units = split_access_units(&stream);
    if units.is_empty() {
        bail!("输入文件中未找到 NAL 单元: {}", cli.input.display());
    }
    let limit = cli.max_units.unwrap_or(units.len());
    info!("共 {} 个访问单元, 解码 {} 个", units.len(), limit.min(units.len()));

    for (index, unit) in units.iter().take(limit).enumerate() {
        log::trace!(
            "访问单元 {index}: {} 字节, 关键帧={}",
            unit.len(),
            is_keyframe(unit)
        );
        match decoder.decode_frame(unit) {
            Ok(DecodeOutcome::FrameDelivered) | Ok(DecodeOutcome::NeedMoreData) => {}
            // 错误已由错误观察者记录
            Err(_) if decoder.is_ready() => {}
            Err(e) => bail!("解码器已停止工作: {e}"),
        }
        decoder.poll();
    }

    if let Some(writer) = &writer {
        writer.borrow_mut().flush().context("写入输出文件失败")?;
    }
    if let Some(e) = write_error.borrow_mut().take() {
        return Err(e).context("写入输出文件失败");
    }

    let stats = decoder.stats();
    info!("解码统计: {}", serde_json::to_string(&stats)?);
    println!("{}", serde_json::to_string_pretty(&stats)?);
    decoder.shutdown();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_dir, "vdec-cli", cli.verbose)?;
    run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("vdec-cli").chain(args.iter().copied()))
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decoder.json");
        std::fs::write(
            &path,
            r#"{"max_width": 320, "max_height": 240, "pixel_format": "RGB888", "input_buffer_size": 4096}"#,
        )
        .unwrap();

        let cli = cli_with(&["in.h264", "-c", path.to_str().unwrap(), "--width", "160", "-f", "rgb565"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.max_width, 160);
        assert_eq!(config.max_height, 240);
        assert_eq!(config.pixel_format, PixelFormat::Rgb565);
        assert_eq!(config.input_buffer_size, 4096);
        assert!(config.engine.is_none());
    }

    #[test]
    fn test_defaults_without_config_file() {
        let cli = cli_with(&["in.h264", "--engine", "software"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!((config.max_width, config.max_height), (640, 480));
        assert_eq!(config.engine.as_deref(), Some("software"));
    }

    #[test]
    fn test_bad_config_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_run_writes_raw_frames() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.h264");
        let output = dir.path().join("out.rgb");
        let stream = [
            &[0u8, 0, 0, 1, 0x67, 0x42, 0x00, 0x1E, 0xDA, 0x25, 0x90][..],
            &[0, 0, 0, 1, 0x68, 0xCE, 0x38, 0x80],
            &[0, 0, 0, 1, 0x65, 0x88, 0x84],
            &[0, 0, 1, 0x41, 0x9A, 0x02],
        ]
        .concat();
        std::fs::write(&input, stream).unwrap();

        let cli = cli_with(&[
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--width",
            "64",
            "--height",
            "64",
            "-f",
            "RGB565",
        ]);
        run(&cli).unwrap();
        // 两个 32x32 RGB565 帧
        assert_eq!(std::fs::metadata(&output).unwrap().len(), 2 * 32 * 32 * 2);
    }
}
