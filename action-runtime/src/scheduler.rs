//! # Scheduler 模块
//!
//! 动作调度器：持有所有活跃 ticker，每帧统一推进。
//!
//! ```rust,ignore
//! let mut scheduler = ActionScheduler::new();
//! let id = scheduler.run_on(&sprite, Action::move_by(100.0, 0.0, 0.5));
//! scheduler.queue_after(id, Action::fade_out(0.2));
//!
//! // 每帧调用（毫秒）
//! for event in scheduler.tick(16.0, None, None) {
//!     // ...
//! }
//! ```
//!
//! ## 调度规则
//!
//! 1. 按注册顺序的逆序访问 ticker，推进过程中移除当前项不会跳过或重复访问其他项
//! 2. 分类掩码与动作的掩码没有交集时跳过
//! 3. 目标被销毁或脱离场景时直接注销，不算失败
//! 4. 目标或其祖先暂停时跳过本帧
//! 5. 时间增量 = 毫秒数 / 1000 × 目标作用域的继承速度（ticker 再乘以动作自身速度）；
//!    配置了 `max_delta_ms` 时先截断毫秒数
//! 6. 单个 ticker 推进失败只影响它自己：错误交给回调（或记录日志），该 ticker 被注销
//! 7. 完成的 ticker 被注销，排在它后面的动作在同一帧注册为新的 ticker

use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::action::Action;
use crate::config::SchedulerConfig;
use crate::error::ActionError;
use crate::target::{ActionTarget, inherited_speed, is_live, is_paused_in_scope};
use crate::ticker::{ActionTicker, TickOutcome, TickerId};

/// 调度事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEvent {
    /// ticker 已注册（包括排队动作被接续注册）
    Started(TickerId),
    /// 动作自然完成
    Completed(TickerId),
    /// 目标失效，ticker 被注销
    Invalidated(TickerId),
    /// 推进失败，ticker 被注销
    Failed(TickerId),
    /// 被显式移除或被同 key 的新动作顶替
    Stopped(TickerId),
}

/// 已注册的 ticker
struct ScheduledTicker {
    id: TickerId,
    ticker: ActionTicker,
    /// 完成后依次接续执行的动作
    queued: Vec<Action>,
}

impl ScheduledTicker {
    fn targets<T: ActionTarget>(&self, target: &Rc<T>) -> bool {
        same_target(self.ticker.target(), target)
    }
}

fn same_target<T: ActionTarget>(handle: &Weak<dyn ActionTarget>, target: &Rc<T>) -> bool {
    std::ptr::addr_eq(handle.as_ptr(), Rc::as_ptr(target))
}

/// 动作调度器
///
/// 显式持有的调度状态，没有全局单例：调用方创建实例并在帧循环中调用 [`tick`](Self::tick)。
/// 所有操作都在同一线程上同步执行。
pub struct ActionScheduler {
    /// 注册顺序即调度顺序
    tickers: Vec<ScheduledTicker>,
    next_id: u64,
    events: Vec<ActionEvent>,
    config: SchedulerConfig,
}

impl Default for ActionScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionScheduler")
            .field("tickers", &self.tickers.len())
            .field("next_id", &self.next_id)
            .field("config", &self.config)
            .finish()
    }
}

impl ActionScheduler {
    /// 使用默认配置创建调度器
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            tickers: Vec::new(),
            next_id: 1,
            events: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn next_ticker_id(&mut self) -> TickerId {
        let id = TickerId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn register(
        &mut self,
        handle: Weak<dyn ActionTarget>,
        action: Action,
        key: Option<String>,
    ) -> TickerId {
        let id = self.next_ticker_id();
        debug!(ticker = %id, key = ?key, "注册动作");
        self.tickers.push(ScheduledTicker {
            id,
            ticker: ActionTicker::new(handle, action).with_key(key),
            queued: Vec::new(),
        });
        self.events.push(ActionEvent::Started(id));
        id
    }

    // ========== 注册 ==========

    /// 在目标上执行动作
    ///
    /// 调度器只持有目标的弱引用。
    pub fn run_on<T: ActionTarget>(&mut self, target: &Rc<T>, action: Action) -> TickerId {
        let target: Rc<dyn ActionTarget> = target.clone();
        self.register(Rc::downgrade(&target), action, None)
    }

    /// 以 `key` 在目标上执行动作
    ///
    /// 同一目标上已有同 key 的 ticker 时，旧 ticker 被移除，key 归新动作所有。
    pub fn run_on_with_key<T: ActionTarget>(
        &mut self,
        target: &Rc<T>,
        action: Action,
        key: impl Into<String>,
    ) -> TickerId {
        let key = key.into();
        if let Some(index) = self.position_for_key(target, &key) {
            let displaced = self.tickers.remove(index);
            debug!(ticker = %displaced.id, key = %key, "同 key 动作被顶替");
            self.events.push(ActionEvent::Stopped(displaced.id));
        }
        let handle: Rc<dyn ActionTarget> = target.clone();
        self.register(Rc::downgrade(&handle), action, Some(key))
    }

    /// 在 ticker 完成后接续执行 `action`（同一目标）
    ///
    /// # 返回
    /// ticker 不存在时返回 `false`
    pub fn queue_after(&mut self, id: TickerId, action: Action) -> bool {
        match self.tickers.iter_mut().find(|s| s.id == id) {
            Some(scheduled) => {
                scheduled.queued.push(action);
                true
            }
            None => false,
        }
    }

    // ========== 移除 ==========

    /// 停止并移除一个 ticker（排队的后续动作一并丢弃）
    pub fn stop(&mut self, id: TickerId) -> bool {
        let Some(index) = self.tickers.iter().position(|s| s.id == id) else {
            return false;
        };
        self.tickers.remove(index);
        self.events.push(ActionEvent::Stopped(id));
        true
    }

    pub fn remove_action_for_key<T: ActionTarget>(&mut self, target: &Rc<T>, key: &str) -> bool {
        let Some(index) = self.position_for_key(target, key) else {
            return false;
        };
        let removed = self.tickers.remove(index);
        self.events.push(ActionEvent::Stopped(removed.id));
        true
    }

    /// 移除目标上的所有动作，返回移除的数量
    pub fn remove_all_actions_for_target<T: ActionTarget>(&mut self, target: &Rc<T>) -> usize {
        let before = self.tickers.len();
        let events = &mut self.events;
        self.tickers.retain(|s| {
            let keep = !s.targets(target);
            if !keep {
                events.push(ActionEvent::Stopped(s.id));
            }
            keep
        });
        before - self.tickers.len()
    }

    /// 清空调度器
    pub fn remove_all_actions(&mut self) {
        for scheduled in self.tickers.drain(..) {
            self.events.push(ActionEvent::Stopped(scheduled.id));
        }
    }

    // ========== 查询 ==========

    pub fn has_target_actions<T: ActionTarget>(&self, target: &Rc<T>) -> bool {
        self.tickers.iter().any(|s| s.targets(target))
    }

    pub fn action_for_key<T: ActionTarget>(&self, target: &Rc<T>, key: &str) -> Option<&Action> {
        self.position_for_key(target, key)
            .map(|index| self.tickers[index].ticker.action())
    }

    /// 按键查找并修改目标上正在运行的动作，例如重新设置分类掩码
    pub fn action_for_key_mut<T: ActionTarget>(
        &mut self,
        target: &Rc<T>,
        key: &str,
    ) -> Option<&mut Action> {
        let index = self.position_for_key(target, key)?;
        Some(self.tickers[index].ticker.action_mut())
    }

    pub fn ticker(&self, id: TickerId) -> Option<&ActionTicker> {
        self.tickers.iter().find(|s| s.id == id).map(|s| &s.ticker)
    }

    pub fn ticker_mut(&mut self, id: TickerId) -> Option<&mut ActionTicker> {
        self.tickers
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| &mut s.ticker)
    }

    pub fn contains(&self, id: TickerId) -> bool {
        self.tickers.iter().any(|s| s.id == id)
    }

    /// 按注册顺序列出所有 ticker ID
    pub fn ticker_ids(&self) -> Vec<TickerId> {
        self.tickers.iter().map(|s| s.id).collect()
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    fn position_for_key<T: ActionTarget>(&self, target: &Rc<T>, key: &str) -> Option<usize> {
        self.tickers
            .iter()
            .position(|s| s.ticker.key() == Some(key) && s.targets(target))
    }

    // ========== 推进 ==========

    /// 推进所有符合条件的 ticker
    ///
    /// # 参数
    /// - `delta_ms`: 本帧经过的时间（毫秒）
    /// - `category_mask`: 只推进掩码有交集的动作；`None` 时使用配置中的默认掩码
    /// - `on_error`: 单个 ticker 推进失败时的回调
    ///
    /// # 返回
    /// 本帧（以及上次 tick 之后注册/移除操作）产生的事件
    pub fn tick(
        &mut self,
        delta_ms: f32,
        category_mask: Option<u32>,
        mut on_error: Option<&mut dyn FnMut(&ActionError)>,
    ) -> Vec<ActionEvent> {
        let delta_seconds = self.config.clamp_delta_ms(delta_ms) / 1000.0;
        let mask = category_mask.or(self.config.default_category_mask);
        let mut advanced = 0usize;

        // 逆序遍历：移除下标 i 只影响 i 之后的元素，它们已经访问过；
        // 接续注册的 ticker 追加在末尾，本帧不会被访问
        for index in (0..self.tickers.len()).rev() {
            let scheduled = &mut self.tickers[index];
            if let Some(mask) = mask {
                if mask & scheduled.ticker.action().category_mask() == 0 {
                    continue;
                }
            }

            let target = match scheduled.ticker.target().upgrade() {
                Some(target) if is_live(target.as_ref()) => target,
                _ => {
                    let removed = self.tickers.remove(index);
                    debug!(ticker = %removed.id, "目标已失效，注销 ticker");
                    self.events.push(ActionEvent::Invalidated(removed.id));
                    continue;
                }
            };
            if is_paused_in_scope(target.as_ref()) {
                continue;
            }

            let delta_time = delta_seconds * inherited_speed(target.as_ref());
            advanced += 1;
            match scheduled.ticker.advance(delta_time) {
                Ok(TickOutcome::Running) => {}
                Ok(TickOutcome::Done { .. }) => {
                    let finished = self.tickers.remove(index);
                    debug!(ticker = %finished.id, queued = finished.queued.len(), "动作完成");
                    self.events.push(ActionEvent::Completed(finished.id));
                    for next in finished.queued {
                        self.register(finished.ticker.target().clone(), next, None);
                    }
                }
                Err(e) => {
                    let failed = self.tickers.remove(index);
                    let error = e.in_ticker(failed.id);
                    if let Some(handler) = on_error.as_deref_mut() {
                        handler(&error);
                    } else if self.config.log_failures {
                        warn!(error = %error, "动作推进失败，已注销该 ticker");
                    }
                    self.events.push(ActionEvent::Failed(failed.id));
                }
            }
        }

        trace!(advanced, remaining = self.tickers.len(), "tick 完成");
        std::mem::take(&mut self.events)
    }
}
