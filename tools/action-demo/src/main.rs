//! # Action Demo
//!
//! 动作调度演示工具 - 以固定帧率无头驱动调度器，每帧输出一行 JSON。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p action-demo -- path --points "0,0 100,0 100,10" --duration 1.0 --fixed-speed --fps 10
//! cargo run -p action-demo -- path --points "0,0 30,0 30,10" --speed 20 --offset --reverse
//! cargo run -p action-demo -- sequence --fps 10
//! cargo run -p action-demo -- --config scheduler.json -v sequence
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use action_runtime::{
    Action, ActionError, ActionScheduler, ActionTarget, SceneNode, SchedulerConfig, SpeedMode,
    TimingMode, Vec2,
};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "actiondemo")]
#[command(about = "动作调度演示工具 - 逐帧输出目标状态")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 帧率（默认：60）
    #[arg(long, default_value = "60", global = true)]
    fps: u32,

    /// 最多运行的帧数，防止无限动作跑不完（默认：600）
    #[arg(long, default_value = "600", global = true)]
    max_frames: u32,

    /// 调度器配置文件（JSON）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 输出调试日志到 stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 沿折线路径移动
    Path {
        /// 路径点，格式 "x,y x,y ..."
        #[arg(long)]
        points: String,

        /// 时长（秒）（默认：1.0）
        #[arg(long, default_value = "1.0")]
        duration: f32,

        /// 以恒定速度（单位/秒）移动，忽略 --duration
        #[arg(long)]
        speed: Option<f32>,

        /// 按弧长分配时间（跨段匀速）
        #[arg(long)]
        fixed_speed: bool,

        /// 路径点视为相对起始位置的偏移
        #[arg(long)]
        offset: bool,

        /// 朝向路径切线方向
        #[arg(long)]
        orient: bool,

        /// 走完后沿反向路径返回
        #[arg(long)]
        reverse: bool,
    },

    /// 运行内置的组合动作示例
    Sequence,
}

/// 单帧输出
#[derive(Serialize)]
struct FrameState {
    frame: u32,
    x: f32,
    y: f32,
    rotation: f32,
    alpha: f32,
    active: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("❌ 运行失败: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.fps == 0 {
        bail!("--fps 必须大于 0");
    }

    let config = match &cli.config {
        Some(path) => SchedulerConfig::load(path),
        None => SchedulerConfig::default(),
    };

    let action = match cli.command {
        Commands::Path {
            points,
            duration,
            speed,
            fixed_speed,
            offset,
            orient,
            reverse,
        } => {
            let points = parse_points(&points)?;
            let action = build_path_action(points, duration, speed, fixed_speed, offset, orient);
            if reverse {
                Action::sequence(vec![action.clone(), action.reversed()])
            } else {
                action
            }
        }
        Commands::Sequence => sequence_scenario(),
    };

    info!(duration = action.duration(), fps = cli.fps, "开始运行");
    simulate(config, action, cli.fps, cli.max_frames)
}

/// 解析 "x,y x,y ..." 格式的路径点
///
/// 逗号与空白都视为分隔符，因此 "100, 10" 与 "100,10" 等价。
fn parse_points(text: &str) -> Result<Vec<Vec2>> {
    let coords = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<f32>().with_context(|| format!("无法解析坐标: {token}")))
        .collect::<Result<Vec<f32>>>()?;

    if coords.len() % 2 != 0 {
        bail!("路径点格式错误: 坐标个数为奇数 ({})", coords.len());
    }
    Ok(coords
        .chunks_exact(2)
        .map(|pair| Vec2::new(pair[0], pair[1]))
        .collect())
}

fn build_path_action(
    points: Vec<Vec2>,
    duration: f32,
    speed: Option<f32>,
    fixed_speed: bool,
    offset: bool,
    orient: bool,
) -> Action {
    match speed {
        Some(speed) => Action::follow_path_at_speed(points, speed, offset, orient),
        None => {
            let mode = if fixed_speed {
                SpeedMode::Fixed
            } else {
                SpeedMode::Dynamic
            };
            Action::follow_path(points, duration, offset, orient, mode)
        }
    }
}

/// 弹出、旋转淡化、停顿、淡出、移除
fn sequence_scenario() -> Action {
    Action::sequence(vec![
        Action::move_by(100.0, 0.0, 0.5).with_timing_mode(TimingMode::EaseOutBack),
        Action::group(vec![
            Action::rotate_by(std::f32::consts::PI, 0.5),
            Action::fade_alpha_to(0.5, 0.5),
        ]),
        Action::wait(0.2),
        Action::repeat(
            Action::sequence(vec![
                Action::scale_by(1.2, 0.1),
                Action::scale_by(1.2, 0.1).reversed(),
            ]),
            2,
        ),
        Action::fade_out(0.3),
        Action::remove_from_parent(),
    ])
}

fn simulate(config: SchedulerConfig, action: Action, fps: u32, max_frames: u32) -> Result<()> {
    let stage = SceneNode::root("stage");
    let node = SceneNode::child_of(&stage, "sprite");
    let mut scheduler = ActionScheduler::with_config(config);
    scheduler.run_on(&node, action);

    let frame_ms = 1000.0 / fps as f32;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut on_error = |e: &ActionError| warn!(error = %e, "动作失败");

    write_frame(&mut out, 0, &node, scheduler.has_target_actions(&node))?;
    for frame in 1..=max_frames {
        scheduler.tick(frame_ms, None, Some(&mut on_error));
        let active = scheduler.has_target_actions(&node);
        write_frame(&mut out, frame, &node, active)?;
        if !active {
            break;
        }
    }
    Ok(())
}

fn write_frame(
    out: &mut impl Write,
    frame: u32,
    node: &Rc<SceneNode>,
    active: bool,
) -> Result<()> {
    let position = node.position();
    let state = FrameState {
        frame,
        x: position.x,
        y: position.y,
        rotation: node.rotation(),
        alpha: node.alpha(),
        active,
    };
    serde_json::to_writer(&mut *out, &state)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_points() {
        let points = parse_points("0,0  100,0\n100, 10").unwrap();
        assert_eq!(
            points,
            vec![Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0), Vec2::new(100.0, 10.0)]
        );
        assert!(parse_points("0,0 oops").is_err());
        assert!(parse_points("1,x").is_err());
        assert!(parse_points("0,0 5").is_err());
        assert_eq!(parse_points("3 , 4").unwrap(), vec![Vec2::new(3.0, 4.0)]);
    }

    #[test]
    fn test_sequence_scenario_finishes() {
        let stage = SceneNode::root("stage");
        let node = SceneNode::child_of(&stage, "sprite");
        let mut scheduler = ActionScheduler::new();
        scheduler.run_on(&node, sequence_scenario());

        for _ in 0..200 {
            scheduler.tick(16.0, None, None);
        }
        assert!(scheduler.is_empty());
        assert_eq!(stage.children_count(), 0);
        assert!((node.position().x - 100.0).abs() < 1e-2);
        assert!(node.alpha().abs() < 1e-5);
    }

    #[test]
    fn test_reverse_path_returns_home() {
        let points = parse_points("0,0 30,0 30,10").unwrap();
        let forward = build_path_action(points, 1.0, Some(20.0), false, true, false);
        let action = Action::sequence(vec![forward.clone(), forward.reversed()]);

        let node = SceneNode::root("n");
        node.set_position(Vec2::new(3.0, 4.0));
        let mut scheduler = ActionScheduler::new();
        scheduler.run_on(&node, action);
        for _ in 0..100 {
            scheduler.tick(50.0, None, None);
        }
        assert!(scheduler.is_empty());
        let position = node.position();
        assert!((position.x - 3.0).abs() < 1e-3);
        assert!((position.y - 4.0).abs() < 1e-3);
    }
}
