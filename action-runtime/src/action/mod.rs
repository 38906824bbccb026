//! # Action 模块
//!
//! 动作树的描述层。
//!
//! `Action` 只描述"做什么"：时长、速度倍率、时间曲线、分类掩码，以及具体的变体。
//! 运行时状态（已用时间、子 ticker、起始值快照）全部放在 [`ActionTicker`] 里，
//! 因此同一个 `Action` 可以同时绑定到多个目标。
//!
//! 克隆 `Action` 只复制一个 `Rc` 和几个标量。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let bounce = Action::sequence(vec![
//!     Action::move_by(0.0, -40.0, 0.25).with_timing_mode(TimingMode::EaseOut),
//!     Action::move_by(0.0, 40.0, 0.25).with_timing_mode(TimingMode::EaseIn),
//! ]);
//! scheduler.run_on(&sprite, Action::repeat_forever(bounce));
//! ```

mod combinator;
mod follow;
mod leaf;

use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::ActionResult;
use crate::math::Vec2;
use crate::path::{PathResampler, SpeedMode};
use crate::target::ActionTarget;
use crate::ticker::{ActionTicker, TickerData};
use crate::timing::TimingMode;

pub use combinator::MAX_REPEAT_ITERATIONS_PER_TICK;
pub use follow::FollowPath;

/// 默认分类掩码（第 0 位）
pub const DEFAULT_CATEGORY_MASK: u32 = 0b1;

/// 重复次数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatCount {
    /// 固定次数（0 表示立即完成的空操作）
    Times(u32),
    /// 无限重复
    Forever,
}

impl RepeatCount {
    /// 兼容 `-1` 表示无限的写法
    ///
    /// 超出 `u32` 的次数截断为 `u32::MAX`。子动作时长为 0 时单帧最多执行
    /// [`MAX_REPEAT_ITERATIONS_PER_TICK`] 轮，这样的重复要跨很多帧才能跑完。
    pub fn from_signed(count: i64) -> Self {
        match u32::try_from(count) {
            Ok(n) => Self::Times(n),
            Err(_) if count < 0 => Self::Forever,
            Err(_) => Self::Times(u32::MAX),
        }
    }
}

/// `run` 动作执行的闭包
pub type RunBlock = Rc<dyn Fn(&dyn ActionTarget) -> ActionResult<()>>;

/// `custom_action` 每一步执行的闭包：`(目标, 缓动后进度, 本步时间增量)`
pub type CustomStep = Rc<dyn Fn(&dyn ActionTarget, f32, f32) -> ActionResult<()>>;

/// 动作变体（封闭集合）
pub(crate) enum ActionKind {
    Sequence(Vec<Action>),
    Group(Vec<Action>),
    Repeat { action: Action, count: RepeatCount },
    FollowPath(FollowPath),

    MoveBy(Vec2),
    MoveTo { x: Option<f32>, y: Option<f32> },
    ScaleBy(Vec2),
    ScaleTo { x: Option<f32>, y: Option<f32> },
    RotateBy(f32),
    RotateTo(f32),
    FadeAlphaBy(f32),
    FadeAlphaTo(f32),
    SpeedBy(f32),
    SpeedTo(f32),
    SetVisible(bool),
    RemoveFromParent,
    Wait,
    Run(RunBlock),
    Custom(CustomStep),
}

impl fmt::Debug for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence(children) => f.debug_tuple("Sequence").field(children).finish(),
            Self::Group(children) => f.debug_tuple("Group").field(children).finish(),
            Self::Repeat { action, count } => f
                .debug_struct("Repeat")
                .field("action", action)
                .field("count", count)
                .finish(),
            Self::FollowPath(follow) => f.debug_tuple("FollowPath").field(follow).finish(),
            Self::MoveBy(v) => f.debug_tuple("MoveBy").field(v).finish(),
            Self::MoveTo { x, y } => f
                .debug_struct("MoveTo")
                .field("x", x)
                .field("y", y)
                .finish(),
            Self::ScaleBy(v) => f.debug_tuple("ScaleBy").field(v).finish(),
            Self::ScaleTo { x, y } => f
                .debug_struct("ScaleTo")
                .field("x", x)
                .field("y", y)
                .finish(),
            Self::RotateBy(v) => f.debug_tuple("RotateBy").field(v).finish(),
            Self::RotateTo(v) => f.debug_tuple("RotateTo").field(v).finish(),
            Self::FadeAlphaBy(v) => f.debug_tuple("FadeAlphaBy").field(v).finish(),
            Self::FadeAlphaTo(v) => f.debug_tuple("FadeAlphaTo").field(v).finish(),
            Self::SpeedBy(v) => f.debug_tuple("SpeedBy").field(v).finish(),
            Self::SpeedTo(v) => f.debug_tuple("SpeedTo").field(v).finish(),
            Self::SetVisible(v) => f.debug_tuple("SetVisible").field(v).finish(),
            Self::RemoveFromParent => f.write_str("RemoveFromParent"),
            Self::Wait => f.write_str("Wait"),
            Self::Run(_) => f.write_str("Run(..)"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// 动作
#[derive(Debug, Clone)]
pub struct Action {
    kind: Rc<ActionKind>,
    /// 声明时长（秒），不含速度倍率
    duration: f32,
    speed: f32,
    timing_mode: TimingMode,
    category_mask: u32,
}

impl Action {
    fn new(kind: ActionKind, duration: f32) -> Self {
        Self {
            kind: Rc::new(kind),
            duration: if duration.is_nan() { 0.0 } else { duration.max(0.0) },
            speed: 1.0,
            timing_mode: TimingMode::default(),
            category_mask: DEFAULT_CATEGORY_MASK,
        }
    }

    // ========== 组合动作 ==========

    /// 依次执行子动作，时长为子动作时长之和
    pub fn sequence(actions: Vec<Action>) -> Self {
        let duration = actions.iter().map(Action::scaled_duration).sum();
        Self::new(ActionKind::Sequence(actions), duration)
    }

    /// 同时执行子动作，时长为子动作时长的最大值
    pub fn group(actions: Vec<Action>) -> Self {
        let duration = actions
            .iter()
            .map(Action::scaled_duration)
            .fold(0.0, f32::max);
        Self::new(ActionKind::Group(actions), duration)
    }

    /// 重复执行 `count` 次
    pub fn repeat(action: Action, count: u32) -> Self {
        Self::repeat_with(action, RepeatCount::Times(count))
    }

    /// 无限重复
    pub fn repeat_forever(action: Action) -> Self {
        Self::repeat_with(action, RepeatCount::Forever)
    }

    pub fn repeat_with(action: Action, count: RepeatCount) -> Self {
        let duration = match count {
            RepeatCount::Times(0) => 0.0,
            RepeatCount::Times(n) => action.scaled_duration() * n as f32,
            RepeatCount::Forever => f32::INFINITY,
        };
        Self::new(ActionKind::Repeat { action, count }, duration)
    }

    // ========== 路径 ==========

    /// 在 `duration` 秒内沿路径移动
    pub fn follow_path(
        points: Vec<Vec2>,
        duration: f32,
        as_offset: bool,
        orient_to_path: bool,
        speed_mode: SpeedMode,
    ) -> Self {
        let follow = FollowPath::by_duration(
            PathResampler::new(points),
            as_offset,
            orient_to_path,
            speed_mode,
        );
        Self::new(ActionKind::FollowPath(follow), duration)
    }

    /// 以每秒 `speed` 个单位的恒定速度沿路径移动
    pub fn follow_path_at_speed(
        points: Vec<Vec2>,
        speed: f32,
        as_offset: bool,
        orient_to_path: bool,
    ) -> Self {
        let follow =
            FollowPath::by_speed(PathResampler::new(points), speed, as_offset, orient_to_path);
        let duration = follow.duration_for_speed();
        Self::new(ActionKind::FollowPath(follow), duration)
    }

    // ========== 位置 ==========

    pub fn move_by(dx: f32, dy: f32, duration: f32) -> Self {
        Self::new(ActionKind::MoveBy(Vec2::new(dx, dy)), duration)
    }

    pub fn move_by_x(dx: f32, duration: f32) -> Self {
        Self::move_by(dx, 0.0, duration)
    }

    pub fn move_by_y(dy: f32, duration: f32) -> Self {
        Self::move_by(0.0, dy, duration)
    }

    pub fn move_to(x: f32, y: f32, duration: f32) -> Self {
        Self::new(ActionKind::MoveTo { x: Some(x), y: Some(y) }, duration)
    }

    pub fn move_to_x(x: f32, duration: f32) -> Self {
        Self::new(ActionKind::MoveTo { x: Some(x), y: None }, duration)
    }

    pub fn move_to_y(y: f32, duration: f32) -> Self {
        Self::new(ActionKind::MoveTo { x: None, y: Some(y) }, duration)
    }

    // ========== 缩放 ==========

    /// 把当前缩放乘以 `factor`
    pub fn scale_by(factor: f32, duration: f32) -> Self {
        Self::scale_by_xy(factor, factor, duration)
    }

    pub fn scale_by_xy(x: f32, y: f32, duration: f32) -> Self {
        Self::new(ActionKind::ScaleBy(Vec2::new(x, y)), duration)
    }

    pub fn scale_to(scale: f32, duration: f32) -> Self {
        Self::scale_to_xy(scale, scale, duration)
    }

    pub fn scale_to_xy(x: f32, y: f32, duration: f32) -> Self {
        Self::new(ActionKind::ScaleTo { x: Some(x), y: Some(y) }, duration)
    }

    pub fn scale_to_x(x: f32, duration: f32) -> Self {
        Self::new(ActionKind::ScaleTo { x: Some(x), y: None }, duration)
    }

    pub fn scale_to_y(y: f32, duration: f32) -> Self {
        Self::new(ActionKind::ScaleTo { x: None, y: Some(y) }, duration)
    }

    // ========== 旋转 ==========

    /// 相对旋转（弧度）
    pub fn rotate_by(angle: f32, duration: f32) -> Self {
        Self::new(ActionKind::RotateBy(angle), duration)
    }

    /// 旋转到绝对角度（弧度）
    pub fn rotate_to(angle: f32, duration: f32) -> Self {
        Self::new(ActionKind::RotateTo(angle), duration)
    }

    // ========== 透明度与可见性 ==========

    pub fn fade_alpha_by(delta: f32, duration: f32) -> Self {
        Self::new(ActionKind::FadeAlphaBy(delta), duration)
    }

    pub fn fade_alpha_to(alpha: f32, duration: f32) -> Self {
        Self::new(ActionKind::FadeAlphaTo(alpha), duration)
    }

    pub fn fade_in(duration: f32) -> Self {
        Self::fade_alpha_to(1.0, duration)
    }

    pub fn fade_out(duration: f32) -> Self {
        Self::fade_alpha_to(0.0, duration)
    }

    pub fn hide() -> Self {
        Self::new(ActionKind::SetVisible(false), 0.0)
    }

    pub fn unhide() -> Self {
        Self::new(ActionKind::SetVisible(true), 0.0)
    }

    // ========== 速度作用域 ==========

    /// 修改目标自身的速度倍率（影响目标及其子节点上的所有动作）
    pub fn speed_by(delta: f32, duration: f32) -> Self {
        Self::new(ActionKind::SpeedBy(delta), duration)
    }

    pub fn speed_to(speed: f32, duration: f32) -> Self {
        Self::new(ActionKind::SpeedTo(speed), duration)
    }

    // ========== 其他 ==========

    pub fn wait(duration: f32) -> Self {
        Self::new(ActionKind::Wait, duration)
    }

    pub fn remove_from_parent() -> Self {
        Self::new(ActionKind::RemoveFromParent, 0.0)
    }

    /// 立即执行一次闭包
    pub fn run(block: impl Fn(&dyn ActionTarget) -> ActionResult<()> + 'static) -> Self {
        Self::new(ActionKind::Run(Rc::new(block)), 0.0)
    }

    /// 在 `duration` 内每一步调用 `step(目标, 缓动后进度, 本步时间增量)`
    pub fn custom_action(
        duration: f32,
        step: impl Fn(&dyn ActionTarget, f32, f32) -> ActionResult<()> + 'static,
    ) -> Self {
        Self::new(ActionKind::Custom(Rc::new(step)), duration)
    }

    // ========== 属性 ==========

    /// 声明时长（秒）
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// 实际播放时长：声明时长除以速度倍率
    pub fn scaled_duration(&self) -> f32 {
        if self.speed > 0.0 {
            self.duration / self.speed
        } else if self.duration == 0.0 {
            0.0
        } else {
            f32::INFINITY
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.set_speed(speed);
        self
    }

    pub fn timing_mode(&self) -> TimingMode {
        self.timing_mode
    }

    pub fn set_timing_mode(&mut self, timing_mode: TimingMode) {
        self.timing_mode = timing_mode;
    }

    pub fn with_timing_mode(mut self, timing_mode: TimingMode) -> Self {
        self.timing_mode = timing_mode;
        self
    }

    pub fn category_mask(&self) -> u32 {
        self.category_mask
    }

    pub fn set_category_mask(&mut self, mask: u32) {
        self.category_mask = mask;
    }

    pub fn with_category_mask(mut self, mask: u32) -> Self {
        self.category_mask = mask;
        self
    }

    /// 是否为组合动作（完成与否由子动作决定）
    pub fn is_combinator(&self) -> bool {
        matches!(
            *self.kind,
            ActionKind::Sequence(_) | ActionKind::Group(_) | ActionKind::Repeat { .. }
        )
    }

    pub(crate) fn kind(&self) -> &ActionKind {
        &self.kind
    }

    // ========== 反向 ==========

    /// 反向动作
    ///
    /// 每个变体都会返回一个动作。相对动作返回取反的增量；绝对动作
    /// （`move_to`、`fade_alpha_to` 等）无法反向，返回等长的 `wait`；
    /// `run`、`custom_action`、`remove_from_parent`、`wait` 返回自身。
    pub fn reversed(&self) -> Self {
        let kind = match &*self.kind {
            ActionKind::Sequence(children) => {
                ActionKind::Sequence(children.iter().rev().map(Action::reversed).collect())
            }
            ActionKind::Group(children) => {
                ActionKind::Group(children.iter().map(Action::reversed).collect())
            }
            ActionKind::Repeat { action, count } => ActionKind::Repeat {
                action: action.reversed(),
                count: *count,
            },
            ActionKind::FollowPath(follow) => ActionKind::FollowPath(follow.reversed()),
            ActionKind::MoveBy(v) => ActionKind::MoveBy(-*v),
            ActionKind::ScaleBy(v) => {
                ActionKind::ScaleBy(Vec2::new(inverse_factor(v.x), inverse_factor(v.y)))
            }
            ActionKind::RotateBy(a) => ActionKind::RotateBy(-a),
            ActionKind::FadeAlphaBy(a) => ActionKind::FadeAlphaBy(-a),
            ActionKind::SpeedBy(s) => ActionKind::SpeedBy(-s),
            ActionKind::SetVisible(v) => ActionKind::SetVisible(!v),
            ActionKind::MoveTo { .. }
            | ActionKind::ScaleTo { .. }
            | ActionKind::RotateTo(_)
            | ActionKind::FadeAlphaTo(_)
            | ActionKind::SpeedTo(_) => ActionKind::Wait,
            ActionKind::RemoveFromParent
            | ActionKind::Wait
            | ActionKind::Run(_)
            | ActionKind::Custom(_) => {
                return self.clone().with_timing_mode(self.timing_mode.reversed());
            }
        };

        Self {
            kind: Rc::new(kind),
            duration: self.duration,
            speed: self.speed,
            timing_mode: self.timing_mode.reversed(),
            category_mask: self.category_mask,
        }
    }

    // ========== 执行 ==========

    /// 首次推进时调用：生成 ticker 的私有数据
    pub(crate) fn setup(
        &self,
        target: &dyn ActionTarget,
        handle: &Weak<dyn ActionTarget>,
    ) -> TickerData {
        match &*self.kind {
            ActionKind::Sequence(children) => TickerData::Sequence {
                children: combinator::child_tickers(children, handle),
                cursor: 0,
            },
            ActionKind::Group(children) => TickerData::Group {
                children: combinator::child_tickers(children, handle),
            },
            ActionKind::Repeat { action, .. } => TickerData::Repeat {
                child: Box::new(ActionTicker::new(handle.clone(), action.clone())),
                completed: 0,
            },
            ActionKind::FollowPath(follow) => follow.setup(target),
            _ => leaf::setup(&self.kind, target),
        }
    }

    /// 按进度推进动作
    ///
    /// # 参数
    /// - `progress`: 缓动后的时间进度（可能越出 [0, 1]）
    /// - `progress_delta`: 与上一步相比的进度增量，相对动作据此累加
    /// - `delta_time`: 本步经过的时间（已乘以 ticker 的速度）
    ///
    /// # 返回
    /// - `Ok(true)`: 动作自行宣告完成
    /// - `Ok(false)`: 由 ticker 根据时长判断是否完成
    pub fn update_action(
        &self,
        target: &dyn ActionTarget,
        progress: f32,
        progress_delta: f32,
        ticker: &mut ActionTicker,
        delta_time: f32,
    ) -> ActionResult<bool> {
        match &*self.kind {
            ActionKind::Sequence(_) => combinator::update_sequence(ticker, delta_time),
            ActionKind::Group(_) => combinator::update_group(ticker, delta_time),
            ActionKind::Repeat { count, .. } => {
                combinator::update_repeat(ticker, *count, delta_time)
            }
            ActionKind::FollowPath(follow) => {
                follow.update(target, progress, &mut ticker.data);
                Ok(false)
            }
            kind => leaf::update(kind, target, progress, progress_delta, &ticker.data, delta_time),
        }
    }
}

fn inverse_factor(factor: f32) -> f32 {
    if factor == 0.0 { 1.0 } else { 1.0 / factor }
}
