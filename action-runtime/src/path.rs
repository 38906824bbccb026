//! # Path 模块
//!
//! 折线路径的弧长重采样。
//!
//! 构造时预计算每段长度、总长度和累计长度权重（每段终点处已走过的长度占比），
//! 之后把线性时间进度映射到 `(段索引, 段内插值 t)`：
//!
//! - [`SpeedMode::Dynamic`]：按点序号均分时间，长段走得快、短段走得慢
//! - [`SpeedMode::Fixed`]：按弧长均分时间，保证跨段匀速

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

const LENGTH_EPSILON: f32 = 1e-6;

/// 路径速度模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedMode {
    /// 时间按点序号均分
    #[default]
    Dynamic,
    /// 时间按弧长均分
    Fixed,
}

/// 段查找游标
///
/// 缓存上一次命中的段索引。进度通常逐帧单调递增，因此从缓存位置向前扫描即可；
/// 进度回退时退回二分查找。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathCursor {
    pub last_index: usize,
}

/// 预计算好的折线路径
#[derive(Debug, Clone, PartialEq)]
pub struct PathResampler {
    points: Vec<Vec2>,
    segment_lengths: Vec<f32>,
    /// 第 i 段终点处的累计长度占比，最后一项为 1
    segment_weights: Vec<f32>,
    total_length: f32,
}

impl PathResampler {
    pub fn new(points: Vec<Vec2>) -> Self {
        let segment_lengths: Vec<f32> = points
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .collect();
        let total_length: f32 = segment_lengths.iter().sum();

        let mut segment_weights = Vec::with_capacity(segment_lengths.len());
        let mut cumulative = 0.0;
        for length in &segment_lengths {
            cumulative += length;
            let weight = if total_length > LENGTH_EPSILON {
                cumulative / total_length
            } else {
                0.0
            };
            segment_weights.push(weight);
        }
        // 消除浮点累加误差
        if let Some(last) = segment_weights.last_mut() {
            if total_length > LENGTH_EPSILON {
                *last = 1.0;
            }
        }

        Self {
            points,
            segment_lengths,
            segment_weights,
            total_length,
        }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn segment_count(&self) -> usize {
        self.segment_lengths.len()
    }

    pub fn segment_lengths(&self) -> &[f32] {
        &self.segment_lengths
    }

    pub fn segment_weights(&self) -> &[f32] {
        &self.segment_weights
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    /// 起点（空路径返回原点）
    pub fn first_point(&self) -> Vec2 {
        self.points.first().copied().unwrap_or_default()
    }

    /// 终点（空路径返回原点）
    pub fn last_point(&self) -> Vec2 {
        self.points.last().copied().unwrap_or_default()
    }

    /// 把时间进度映射为 `(段索引, 段内插值 t ∈ [0, 1])`
    ///
    /// 进度会被限制在 [0, 1]；不足两个点的路径总是返回 `(0, 0.0)`。
    pub fn locate(&self, progress: f32, mode: SpeedMode, cursor: &mut PathCursor) -> (usize, f32) {
        let count = self.segment_count();
        if count == 0 {
            return (0, 0.0);
        }
        let progress = progress.clamp(0.0, 1.0);

        let (index, t) = match mode {
            SpeedMode::Fixed if self.total_length > LENGTH_EPSILON => {
                self.locate_fixed(progress, cursor.last_index)
            }
            // 零长度路径没有弧长可分，退化为按点序号
            _ => self.locate_dynamic(progress),
        };

        cursor.last_index = index;
        (index, t)
    }

    fn locate_dynamic(&self, progress: f32) -> (usize, f32) {
        let count = self.segment_count();
        let scaled = progress * count as f32;
        let index = (scaled.floor() as usize).min(count - 1);
        let t = (scaled - index as f32).clamp(0.0, 1.0);
        (index, t)
    }

    fn locate_fixed(&self, progress: f32, last_index: usize) -> (usize, f32) {
        let last = self.segment_count() - 1;
        let mut index = last_index.min(last);

        if progress < self.start_weight(index) {
            // 进度回退：缓存失效，整表查找
            index = self
                .segment_weights
                .partition_point(|&w| w <= progress)
                .min(last);
        } else {
            while index < last && self.segment_weights[index] <= progress {
                index += 1;
            }
        }

        let start = self.start_weight(index);
        let span = self.segment_weights[index] - start;
        let t = if span > LENGTH_EPSILON {
            ((progress - start) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        (index, t)
    }

    fn start_weight(&self, index: usize) -> f32 {
        if index == 0 {
            0.0
        } else {
            self.segment_weights[index - 1]
        }
    }

    /// 段内插值得到的坐标
    pub fn point_at(&self, segment: usize, t: f32) -> Vec2 {
        match (self.points.get(segment), self.points.get(segment + 1)) {
            (Some(a), Some(b)) => a.lerp(*b, t),
            (Some(a), None) => *a,
            _ => self.last_point(),
        }
    }

    /// 段切线方向（弧度）
    pub fn heading(&self, segment: usize) -> f32 {
        match (self.points.get(segment), self.points.get(segment + 1)) {
            (Some(a), Some(b)) => (*b - *a).angle(),
            _ => 0.0,
        }
    }

    /// 点序反转后的路径
    pub fn reversed(&self) -> Self {
        Self::new(self.points.iter().rev().copied().collect())
    }

    /// 平移所有点，使路径从原点出发
    pub fn relative_to_start(&self) -> Self {
        let origin = self.first_point();
        Self::new(self.points.iter().map(|p| *p - origin).collect())
    }
}
