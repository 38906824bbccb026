//! 路径跟随动作。

use std::rc::Rc;

use crate::math::Vec2;
use crate::path::{PathCursor, PathResampler, SpeedMode};
use crate::target::ActionTarget;
use crate::ticker::TickerData;

/// 时长的来源
#[derive(Debug, Clone, Copy, PartialEq)]
enum PathTiming {
    /// 调用方直接给出时长
    Duration,
    /// 由路径总长度与速度（单位/秒）推算
    Speed(f32),
}

/// 沿折线路径移动目标
///
/// 路径在构造时预计算，克隆时共享。
#[derive(Debug, Clone)]
pub struct FollowPath {
    path: Rc<PathResampler>,
    /// 路径点视为相对目标起始位置的偏移
    as_offset: bool,
    /// 每步把目标旋转到当前段的切线方向
    orient_to_path: bool,
    speed_mode: SpeedMode,
    timing: PathTiming,
}

impl FollowPath {
    pub(crate) fn by_duration(
        path: PathResampler,
        as_offset: bool,
        orient_to_path: bool,
        speed_mode: SpeedMode,
    ) -> Self {
        Self {
            path: Rc::new(path),
            as_offset,
            orient_to_path,
            speed_mode,
            timing: PathTiming::Duration,
        }
    }

    /// 恒定速度只有按弧长分配时间才成立，因此固定使用 [`SpeedMode::Fixed`]
    pub(crate) fn by_speed(
        path: PathResampler,
        speed: f32,
        as_offset: bool,
        orient_to_path: bool,
    ) -> Self {
        Self {
            path: Rc::new(path),
            as_offset,
            orient_to_path,
            speed_mode: SpeedMode::Fixed,
            timing: PathTiming::Speed(speed),
        }
    }

    pub(crate) fn duration_for_speed(&self) -> f32 {
        match self.timing {
            PathTiming::Speed(speed) if speed > 0.0 => self.path.total_length() / speed,
            _ => 0.0,
        }
    }

    pub fn path(&self) -> &PathResampler {
        &self.path
    }

    pub fn as_offset(&self) -> bool {
        self.as_offset
    }

    pub fn orient_to_path(&self) -> bool {
        self.orient_to_path
    }

    pub fn speed_mode(&self) -> SpeedMode {
        self.speed_mode
    }

    pub(crate) fn setup(&self, target: &dyn ActionTarget) -> TickerData {
        let origin = if self.as_offset {
            target.position()
        } else {
            Vec2::zero()
        };
        TickerData::Path {
            origin,
            cursor: PathCursor::default(),
        }
    }

    pub(crate) fn update(&self, target: &dyn ActionTarget, progress: f32, data: &mut TickerData) {
        let TickerData::Path { origin, cursor } = data else {
            return;
        };
        if self.path.points().is_empty() {
            return;
        }

        let (segment, t) = self.path.locate(progress, self.speed_mode, cursor);
        target.set_position(*origin + self.path.point_at(segment, t));
        if self.orient_to_path && self.path.segment_count() > 0 {
            target.set_rotation(self.path.heading(segment));
        }
    }

    /// 反向路径
    ///
    /// 偏移模式下反向后的路径以原终点为起点重新归零，
    /// 这样正向与反向接连执行时目标会回到出发点。
    pub(crate) fn reversed(&self) -> Self {
        let reversed = self.path.reversed();
        let path = if self.as_offset {
            reversed.relative_to_start()
        } else {
            reversed
        };
        Self {
            path: Rc::new(path),
            ..self.clone()
        }
    }
}
