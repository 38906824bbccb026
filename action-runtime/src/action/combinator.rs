//! 组合动作：Sequence、Group、Repeat 的推进逻辑。
//!
//! 剩余时间的流转规则：
//! - Sequence：子动作完成后，本帧未消耗的时间继续交给下一个子动作；
//!   剩余时间为 0 时只会进入时长为 0 的子动作（保证 `run` 等瞬时动作在前一个动作完成的同一帧触发）
//! - Group：每个未完成的子动作都拿到完整的时间增量，先完成的子动作停在终态
//! - Repeat：一轮完成后把剩余时间交给下一轮；无限重复一个时长为 0 的子动作时每帧只执行一轮。
//!   单帧最多执行 [`MAX_REPEAT_ITERATIONS_PER_TICK`] 轮，超出的轮次留到后续帧，本帧剩余时间丢弃

use std::rc::Weak;

use super::{Action, RepeatCount};
use crate::error::ActionResult;
use crate::target::ActionTarget;
use crate::ticker::{ActionTicker, TickOutcome, TickerData};

/// Repeat 单帧内最多执行的轮数
pub const MAX_REPEAT_ITERATIONS_PER_TICK: u32 = 1024;

pub(super) fn child_tickers(
    children: &[Action],
    handle: &Weak<dyn ActionTarget>,
) -> Vec<ActionTicker> {
    children
        .iter()
        .map(|child| ActionTicker::new(handle.clone(), child.clone()))
        .collect()
}

pub(super) fn update_sequence(ticker: &mut ActionTicker, delta_time: f32) -> ActionResult<bool> {
    let TickerData::Sequence { children, cursor } = &mut ticker.data else {
        return Ok(true);
    };

    let mut remaining = delta_time;
    while let Some(child) = children.get_mut(*cursor) {
        if remaining <= 0.0 && child.action().scaled_duration() > 0.0 {
            return Ok(false);
        }
        match child.advance(remaining)? {
            TickOutcome::Running => return Ok(false),
            TickOutcome::Done { leftover } => {
                *cursor += 1;
                remaining = leftover;
            }
        }
    }
    Ok(true)
}

pub(super) fn update_group(ticker: &mut ActionTicker, delta_time: f32) -> ActionResult<bool> {
    let TickerData::Group { children } = &mut ticker.data else {
        return Ok(true);
    };

    let mut all_done = true;
    for child in children.iter_mut().filter(|c| !c.is_done()) {
        if child.advance(delta_time)? == TickOutcome::Running {
            all_done = false;
        }
    }
    Ok(all_done)
}

pub(super) fn update_repeat(
    ticker: &mut ActionTicker,
    count: RepeatCount,
    delta_time: f32,
) -> ActionResult<bool> {
    let TickerData::Repeat { child, completed } = &mut ticker.data else {
        return Ok(true);
    };
    if count == RepeatCount::Times(0) {
        return Ok(true);
    }

    let instant = child.action().scaled_duration() <= 0.0;
    let mut remaining = delta_time;
    for _ in 0..MAX_REPEAT_ITERATIONS_PER_TICK {
        let TickOutcome::Done { leftover } = child.advance(remaining)? else {
            return Ok(false);
        };

        *completed = completed.saturating_add(1);
        if let RepeatCount::Times(limit) = count {
            if *completed >= limit {
                return Ok(true);
            }
        }

        child.reset();
        let keep_going = match count {
            RepeatCount::Times(_) => leftover > 0.0 || instant,
            RepeatCount::Forever => leftover > 0.0 && !instant,
        };
        if !keep_going {
            return Ok(false);
        }
        remaining = leftover;
    }
    Ok(false)
}
