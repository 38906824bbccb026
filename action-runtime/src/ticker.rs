//! # Ticker 模块
//!
//! 动作树与目标的运行时绑定。
//!
//! 生命周期：`Created → (首次推进) Setup → Running → Done`。
//! `reset()` 让 ticker 回到 Setup 之前的计时状态，但不会把它从调度器中移除。

use std::fmt;
use std::rc::Weak;

use tracing::warn;

use crate::action::Action;
use crate::error::ActionResult;
use crate::math::Vec2;
use crate::path::PathCursor;
use crate::target::ActionTarget;
use crate::timing::TimingMode;

/// Ticker ID
///
/// 由 `ActionScheduler` 在注册时分配，单调递增，不会重复。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickerId(pub(crate) u64);

impl TickerId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// 获取内部 ID 值
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticker({})", self.0)
    }
}

/// 单次推进的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// 仍在进行
    Running,
    /// 已完成；`leftover` 为本次时间增量中未被消耗的部分（调用方的时间基准）
    Done { leftover: f32 },
}

impl TickOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }
}

/// 动作在首次推进时生成的私有数据
#[derive(Debug, Default)]
pub enum TickerData {
    /// 尚未 setup，或动作不需要数据
    #[default]
    Empty,
    Sequence {
        children: Vec<ActionTicker>,
        /// 当前执行的子动作下标
        cursor: usize,
    },
    Group {
        children: Vec<ActionTicker>,
    },
    Repeat {
        child: Box<ActionTicker>,
        /// 已完成的轮数
        completed: u32,
    },
    /// 绝对动作的起始向量（位置或缩放）
    StartVector(Vec2),
    /// 绝对动作的起始标量（旋转、透明度、速度）
    StartScalar(f32),
    /// `scale_by` 在 setup 时换算出的缩放增量
    ScaleDelta(Vec2),
    Path {
        origin: Vec2,
        cursor: PathCursor,
    },
}

impl TickerData {
    /// 组合动作的数据原地重置并返回 `true`；其余返回 `false`
    fn reset_children(&mut self) -> bool {
        match self {
            Self::Sequence { children, cursor } => {
                *cursor = 0;
                children.iter_mut().for_each(ActionTicker::reset);
                true
            }
            Self::Group { children } => {
                children.iter_mut().for_each(ActionTicker::reset);
                true
            }
            Self::Repeat { child, completed } => {
                *completed = 0;
                child.reset();
                true
            }
            _ => false,
        }
    }
}

/// 动作执行记录
///
/// 把一棵动作树绑定到一个目标上，记录已用时间与完成状态。
/// 组合动作为每个子动作各建一个子 ticker，放在 [`TickerData`] 中。
#[derive(Debug)]
pub struct ActionTicker {
    target: Weak<dyn ActionTarget>,
    action: Action,
    key: Option<String>,
    /// 已经过的时间（已乘以速度）
    elapsed: f32,
    is_setup: bool,
    is_done: bool,
    /// 时间走满是否即视为完成（组合动作由子动作决定）
    auto_complete: bool,
    /// setup 时记录的速度快照
    speed: f32,
    /// setup 时记录的时长快照
    duration: f32,
    timing_mode: TimingMode,
    time_distance: f32,
    eased_time_distance: f32,
    pub(crate) data: TickerData,
}

impl ActionTicker {
    pub fn new(target: Weak<dyn ActionTarget>, action: Action) -> Self {
        Self {
            target,
            auto_complete: !action.is_combinator(),
            speed: action.speed(),
            duration: action.duration(),
            timing_mode: action.timing_mode(),
            action,
            key: None,
            elapsed: 0.0,
            is_setup: false,
            is_done: false,
            time_distance: 0.0,
            eased_time_distance: 0.0,
            data: TickerData::Empty,
        }
    }

    pub fn with_key(mut self, key: Option<String>) -> Self {
        self.key = key;
        self
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    /// 修改正在运行的动作
    ///
    /// 分类掩码每帧重新读取，修改立即生效；速度、时长与缓动曲线在首次推进时固定，
    /// 之后的修改要等 `reset()` 后才会被采用。
    pub fn action_mut(&mut self) -> &mut Action {
        &mut self.action
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn target(&self) -> &Weak<dyn ActionTarget> {
        &self.target
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_setup(&self) -> bool {
        self.is_setup
    }

    pub fn is_done(&self) -> bool {
        self.is_done
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// 线性时间进度，总在 [0, 1] 内
    pub fn time_distance(&self) -> f32 {
        self.time_distance
    }

    /// 缓动后的时间进度，可能越出 [0, 1]
    pub fn eased_time_distance(&self) -> f32 {
        self.eased_time_distance
    }

    pub fn data(&self) -> &TickerData {
        &self.data
    }

    /// 由动作主动宣告完成
    pub fn mark_done(&mut self) {
        self.is_done = true;
    }

    fn setup(&mut self, target: &dyn ActionTarget) {
        self.speed = self.action.speed();
        self.duration = self.action.duration();
        self.timing_mode = self.action.timing_mode();
        self.data = self.action.setup(target, &self.target);
        self.is_setup = true;
    }

    /// 推进 `delta_time` 秒（调用方时间基准，ticker 会再乘以自身速度）
    pub fn advance(&mut self, delta_time: f32) -> ActionResult<TickOutcome> {
        if self.is_done {
            return Ok(TickOutcome::Done {
                leftover: delta_time.max(0.0),
            });
        }

        let Some(target) = self.target.upgrade() else {
            warn!(action = ?self.action.kind(), "目标已释放，动作提前结束");
            self.is_done = true;
            return Ok(TickOutcome::Done { leftover: 0.0 });
        };

        if !self.is_setup {
            self.setup(target.as_ref());
        }

        let scaled_delta = delta_time * self.speed;
        self.elapsed += scaled_delta;
        self.time_distance = if self.duration > 0.0 {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let eased = self.timing_mode.apply(self.time_distance);
        let progress_delta = eased - self.eased_time_distance;
        self.eased_time_distance = eased;

        let action = self.action.clone();
        let finished =
            action.update_action(target.as_ref(), eased, progress_delta, self, scaled_delta)?;

        if finished || self.is_done || (self.auto_complete && self.time_distance >= 1.0) {
            self.is_done = true;
            return Ok(TickOutcome::Done {
                leftover: self.leftover(delta_time),
            });
        }
        Ok(TickOutcome::Running)
    }

    /// 超出时长的部分换算回调用方的时间基准
    fn leftover(&self, delta_time: f32) -> f32 {
        if !self.duration.is_finite() || self.speed <= 0.0 {
            return 0.0;
        }
        let overshoot = (self.elapsed - self.duration).max(0.0) / self.speed;
        overshoot.min(delta_time.max(0.0))
    }

    /// 回到首次推进前的计时状态
    ///
    /// 组合动作保留子 ticker 并递归重置；叶子动作清空数据，下次推进时重新 setup
    /// （绝对动作会重新捕获起始值）。连续调用两次与调用一次结果相同。
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.time_distance = 0.0;
        self.eased_time_distance = 0.0;
        self.is_done = false;
        if !self.data.reset_children() {
            self.data = TickerData::Empty;
            self.is_setup = false;
        }
    }
}
